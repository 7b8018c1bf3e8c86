use std::cell::RefCell;

use crate::traits::check_limits;
use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{rand::Rng, rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Uniform random design: each component of each sample is drawn
/// independently in its interval.
///
/// Successive calls to `sample` continue the same random stream.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Random<F: Float, R: Rng> {
    xlimits: Array2<F>,
    rng: RefCell<R>,
}

impl<F: Float> Random<F, Xoshiro256Plus> {
    /// Random design over `xlimits` (a (nx, 2) matrix \[\[lower bound, upper bound\], ...\])
    /// with a generator seeded from entropy
    ///
    /// ```
    /// use gpfit_doe::Random;
    /// use ndarray::arr2;
    ///
    /// let doe = Random::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::from_rng(xlimits, Xoshiro256Plus::from_entropy())
    }

    /// Random design over `xlimits` with a generator seeded from `seed`
    pub fn seeded(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, seed: u64) -> Self {
        Self::from_rng(xlimits, Xoshiro256Plus::seed_from_u64(seed))
    }
}

impl<F: Float, R: Rng> Random<F, R> {
    /// Random design over `xlimits` drawing from the given generator
    ///
    /// **Panics** if xlimits is not a (nx, 2) matrix with lower <= upper bounds.
    pub fn from_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        let xlimits = xlimits.to_owned();
        check_limits(&xlimits);
        Random {
            xlimits,
            rng: RefCell::new(rng),
        }
    }

    /// Replaces the random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Random<F, R2> {
        Random::from_rng(&self.xlimits, rng)
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for Random<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let rng = &mut *self.rng.borrow_mut();
        let unit = Uniform::new(0., 1.);
        Array::random_using((ns, self.xlimits.nrows()), unit, rng).mapv(F::cast)
    }
}
