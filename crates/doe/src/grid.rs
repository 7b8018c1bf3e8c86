use crate::traits::check_limits;
use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array, Array1, Array2, ArrayBase, Data, Ix2};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// The Grid design places samples at regularly spaced levels of each
/// component, both bounds included, and takes all combinations of them.
///
/// In one dimension `Grid::new(&arr2(&[[lo, hi]])).sample(n)` is `linspace(lo, hi, n)`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Grid<F: Float> {
    /// Sample space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of a sample x
    xlimits: Array2<F>,
}

/// Largest `b` such that `b^nx <= ns`
fn integer_root(ns: usize, nx: usize) -> usize {
    if nx == 0 {
        return 1;
    }
    let exp = nx as u32;
    let mut b = (ns as f64).powf(1. / nx as f64).round() as usize;
    while b > 0 && b.checked_pow(exp).map_or(true, |p| p > ns) {
        b -= 1;
    }
    while (b + 1).checked_pow(exp).map_or(false, |p| p <= ns) {
        b += 1;
    }
    b
}

impl<F: Float> Grid<F> {
    /// Constructor given a sample space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use gpfit_doe::Grid;
    /// use ndarray::arr2;
    ///
    /// let doe = Grid::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        let xlimits = xlimits.to_owned();
        check_limits(&xlimits);
        Grid { xlimits }
    }

    /// Number of levels per component used to get at least `ns` samples.
    ///
    /// All components get the integer `nx`-th root of `ns`, then leading
    /// components get one more level until the product reaches `ns`,
    /// so that level counts differ by one at most.
    pub fn levels(&self, ns: usize) -> Array1<usize> {
        let nx = self.xlimits.nrows();
        let base = integer_root(ns, nx).max(1);
        let mut levels = Array1::from_elem(nx, base);
        for j in 0..nx {
            if levels.product() >= ns {
                break;
            }
            levels[j] += 1;
        }
        levels
    }
}

impl<F: Float> SamplingMethod<F> for Grid<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let levels = self.levels(ns);
        let axes: Vec<Array1<F>> = levels
            .iter()
            .map(|&n| Array::linspace(F::zero(), F::one(), n))
            .collect();
        // row i is the mixed radix decomposition of i, first component varying slowest
        let mut strides = vec![1; nx];
        for j in (0..nx.saturating_sub(1)).rev() {
            strides[j] = strides[j + 1] * levels[j + 1];
        }
        Array2::from_shape_fn((ns, nx), |(i, j)| axes[j][(i / strides[j]) % levels[j]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, array, Axis};

    #[test]
    fn test_integer_root() {
        assert_eq!(10, integer_root(100, 1));
        assert_eq!(3, integer_root(9, 2));
        assert_eq!(3, integer_root(15, 2));
        assert_eq!(4, integer_root(16, 2));
        assert_eq!(2, integer_root(26, 3));
        assert_eq!(3, integer_root(27, 3));
        assert_eq!(0, integer_root(0, 2));
    }

    #[test]
    fn test_grid_1d_is_linspace() {
        let xlimits = arr2(&[[0., 1.]]);
        let actual = Grid::new(&xlimits).sample(100);
        let expected = Array::linspace(0., 1., 100).insert_axis(Axis(1));
        assert_eq!(actual.dim(), (100, 1));
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_2d() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let expected = array![
            [5., 0.],
            [5., 0.5],
            [5., 1.],
            [7.5, 0.],
            [7.5, 0.5],
            [7.5, 1.],
            [10., 0.],
            [10., 0.5],
            [10., 1.],
        ];
        let actual = Grid::new(&xlimits).sample(9);
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-6);
    }

    #[test]
    fn test_grid_truncated() {
        // levels [3, 2]: first component slowest
        let actual = Grid::new(&arr2(&[[0., 1.], [0., 1.]])).sample(5);
        let expected = array![[0., 0.], [0., 1.], [0.5, 0.], [0.5, 1.], [1., 0.]];
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_levels() {
        let grid = Grid::new(&arr2(&[[0., 1.], [0., 1.], [0., 1.]]));
        assert_eq!(array![2, 2, 2], grid.levels(8));
        assert_eq!(array![3, 2, 2], grid.levels(9));
        assert_eq!(array![3, 3, 2], grid.levels(13));
        assert_eq!(array![1, 1, 1], grid.levels(1));
    }

    #[test]
    fn test_grid_single_point() {
        let actual = Grid::new(&arr2(&[[-2., 3.]])).sample(1);
        assert_abs_diff_eq!(array![[-2.]], actual);
    }

    #[test]
    fn test_grid_empty() {
        let actual = Grid::new(&arr2(&[[0., 1.], [0., 1.]])).sample(0);
        assert_eq!((0, 2), actual.dim());
    }

    #[test]
    #[should_panic]
    fn test_grid_bad_limits() {
        Grid::new(&arr2(&[[1., 0.]]));
    }
}
