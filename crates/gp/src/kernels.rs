//! A module for kernels (covariance functions) of the GP prior.
//!
//! The following kernels are implemented:
//! * radial basis function (squared exponential),
//! * matern 5/2,
//! * scale kernel wrapping any of them with a trainable output scale.
//!
//! Kernel hyperparameters are stored as raw values mapped through a [`Constraint`].

use crate::constraints::Constraint;
use crate::utils::pairwise_sq_distances;
use linfa::Float;
use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix1, Ix2, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trait for using a kernel in GP regression
pub trait Kernel<F: Float>: Clone + fmt::Debug + fmt::Display + Sync {
    /// Compute the (n, m) covariance matrix `k(x, z)` between `x` (n, nx) and `z` (m, nx)
    fn value(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        z: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F>;

    /// Compute the (n,) variances `k(x_i, x_i)`
    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F>;

    /// Raw parameter values
    fn raw_params(&self) -> Array1<F>;

    /// Set raw parameter values, `raw` length has to be [`Kernel::n_params`]
    fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>);

    /// Hyperparameter (name, value) pairs
    fn hyperparameters(&self) -> Vec<(String, F)>;

    /// Derivatives of the (n, n) matrix `k(x, x)` wrt each raw parameter
    fn raw_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array2<F>>;

    /// Number of raw parameters
    fn n_params(&self) -> usize {
        self.raw_params().len()
    }
}

/// Radial basis function kernel
///
/// `k(x, z) = exp(-|x - z|^2 / (2 l^2))` with `l` the length scale
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RbfKernel<F: Float> {
    raw_lengthscale: F,
    lengthscale_constraint: Constraint<F>,
}

impl<F: Float> Default for RbfKernel<F> {
    fn default() -> Self {
        RbfKernel {
            raw_lengthscale: F::zero(),
            lengthscale_constraint: Constraint::Positive,
        }
    }
}

impl<F: Float> RbfKernel<F> {
    /// Constructor given an initial length scale
    ///
    /// A non positive length scale is reported when GP parameters are checked.
    pub fn new(lengthscale: F) -> Self {
        let kernel = Self::default();
        kernel.with_lengthscale(lengthscale)
    }

    /// Set length scale value
    pub fn with_lengthscale(mut self, lengthscale: F) -> Self {
        self.raw_lengthscale = raw_or_nan(&self.lengthscale_constraint, lengthscale);
        self
    }

    /// Current length scale
    pub fn lengthscale(&self) -> F {
        self.lengthscale_constraint.transform(self.raw_lengthscale)
    }
}

impl<F: Float> Kernel<F> for RbfKernel<F> {
    fn value(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        z: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let l = self.lengthscale();
        let scale = F::cast(-0.5) / (l * l);
        pairwise_sq_distances(x, z).mapv(|d2| (d2 * scale).exp())
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::ones(x.nrows())
    }

    fn raw_params(&self) -> Array1<F> {
        Array1::from_elem(1, self.raw_lengthscale)
    }

    fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>) {
        self.raw_lengthscale = raw[0];
    }

    fn hyperparameters(&self) -> Vec<(String, F)> {
        vec![("lengthscale".to_string(), self.lengthscale())]
    }

    /// dk/dl = k * d^2 / l^3
    fn raw_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array2<F>> {
        let l = self.lengthscale();
        let dl = self.lengthscale_constraint.derivative(self.raw_lengthscale);
        let scale = F::cast(-0.5) / (l * l);
        let factor = dl / (l * l * l);
        let d2 = pairwise_sq_distances(x, x);
        let mut grad = Array2::zeros(d2.raw_dim());
        Zip::from(&mut grad)
            .and(&d2)
            .for_each(|g, &d2| *g = (d2 * scale).exp() * d2 * factor);
        vec![grad]
    }
}

impl<F: Float> fmt::Display for RbfKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RbfKernel(lengthscale={})", self.lengthscale())
    }
}

/// Matern 5/2 kernel
///
/// `k(x, z) = (1 + s + s^2 / 3) exp(-s)` with `s = sqrt(5) |x - z| / l`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Matern52Kernel<F: Float> {
    raw_lengthscale: F,
    lengthscale_constraint: Constraint<F>,
}

impl<F: Float> Default for Matern52Kernel<F> {
    fn default() -> Self {
        Matern52Kernel {
            raw_lengthscale: F::zero(),
            lengthscale_constraint: Constraint::Positive,
        }
    }
}

impl<F: Float> Matern52Kernel<F> {
    /// Constructor given an initial length scale
    pub fn new(lengthscale: F) -> Self {
        Self::default().with_lengthscale(lengthscale)
    }

    /// Set length scale value
    pub fn with_lengthscale(mut self, lengthscale: F) -> Self {
        self.raw_lengthscale = raw_or_nan(&self.lengthscale_constraint, lengthscale);
        self
    }

    /// Current length scale
    pub fn lengthscale(&self) -> F {
        self.lengthscale_constraint.transform(self.raw_lengthscale)
    }

    fn scaled_distances(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        z: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let sqrt5_l = F::cast(5.).sqrt() / self.lengthscale();
        pairwise_sq_distances(x, z).mapv(|d2| d2.sqrt() * sqrt5_l)
    }
}

impl<F: Float> Kernel<F> for Matern52Kernel<F> {
    fn value(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        z: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let third = F::cast(1. / 3.);
        self.scaled_distances(x, z)
            .mapv(|s| (F::one() + s + s * s * third) * (-s).exp())
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::ones(x.nrows())
    }

    fn raw_params(&self) -> Array1<F> {
        Array1::from_elem(1, self.raw_lengthscale)
    }

    fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>) {
        self.raw_lengthscale = raw[0];
    }

    fn hyperparameters(&self) -> Vec<(String, F)> {
        vec![("lengthscale".to_string(), self.lengthscale())]
    }

    /// dk/dl = s^2 (1 + s) exp(-s) / (3 l)
    fn raw_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array2<F>> {
        let l = self.lengthscale();
        let dl = self.lengthscale_constraint.derivative(self.raw_lengthscale);
        let factor = dl / (F::cast(3.) * l);
        let grad = self
            .scaled_distances(x, x)
            .mapv(|s| s * s * (F::one() + s) * (-s).exp() * factor);
        vec![grad]
    }
}

impl<F: Float> fmt::Display for Matern52Kernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matern52Kernel(lengthscale={})", self.lengthscale())
    }
}

/// Kernel scaled by a trainable output scale: `k(x, z) = outputscale * base(x, z)`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ScaleKernel<F: Float, K> {
    base: K,
    raw_outputscale: F,
    outputscale_constraint: Constraint<F>,
}

impl<F: Float, K: Kernel<F> + Default> Default for ScaleKernel<F, K> {
    fn default() -> Self {
        ScaleKernel::new(K::default())
    }
}

impl<F: Float, K: Kernel<F>> ScaleKernel<F, K> {
    /// Constructor wrapping the `base` kernel, output scale raw value is 0
    pub fn new(base: K) -> Self {
        ScaleKernel {
            base,
            raw_outputscale: F::zero(),
            outputscale_constraint: Constraint::Positive,
        }
    }

    /// Set output scale value
    pub fn with_outputscale(mut self, outputscale: F) -> Self {
        self.raw_outputscale = raw_or_nan(&self.outputscale_constraint, outputscale);
        self
    }

    /// Current output scale
    pub fn outputscale(&self) -> F {
        self.outputscale_constraint.transform(self.raw_outputscale)
    }

    /// Wrapped kernel
    pub fn base(&self) -> &K {
        &self.base
    }
}

impl<F: Float, K: Kernel<F>> Kernel<F> for ScaleKernel<F, K> {
    fn value(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        z: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let o = self.outputscale();
        self.base.value(x, z).mapv(|v| v * o)
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        let o = self.outputscale();
        self.base.diag(x).mapv(|v| v * o)
    }

    fn raw_params(&self) -> Array1<F> {
        let base = self.base.raw_params();
        let mut raw = Array1::zeros(1 + base.len());
        raw[0] = self.raw_outputscale;
        raw.slice_mut(s![1..]).assign(&base);
        raw
    }

    fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>) {
        self.raw_outputscale = raw[0];
        self.base.set_raw_params(&raw.slice(s![1..]));
    }

    fn hyperparameters(&self) -> Vec<(String, F)> {
        let mut hyps = vec![("outputscale".to_string(), self.outputscale())];
        hyps.extend(self.base.hyperparameters());
        hyps
    }

    /// dk/do = base, dk/dtheta = o * dbase/dtheta
    fn raw_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array2<F>> {
        let o = self.outputscale();
        let d_o = self.outputscale_constraint.derivative(self.raw_outputscale);
        let mut grads = vec![self.base.value(x, x).mapv(|v| v * d_o)];
        grads.extend(
            self.base
                .raw_gradients(x)
                .into_iter()
                .map(|g| g.mapv(|v| v * o)),
        );
        grads
    }
}

impl<F: Float, K: Kernel<F>> fmt::Display for ScaleKernel<F, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ScaleKernel(outputscale={}, {})",
            self.outputscale(),
            self.base
        )
    }
}

/// Scaled RBF kernel, the usual kernel of a simple GP regression
pub type ScaledRbfKernel<F> = ScaleKernel<F, RbfKernel<F>>;

/// Invalid values are kept as NaN raw values to be reported by parameters checking
fn raw_or_nan<F: Float>(constraint: &Constraint<F>, value: F) -> F {
    constraint.inverse_transform(value).unwrap_or(F::nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::{array, Array};
    use paste::paste;

    #[test]
    fn test_rbf_value() {
        let x = array![[0.], [1.]];
        let k = RbfKernel::new(1.).value(&x, &x);
        let e = (-0.5f64).exp();
        assert_abs_diff_eq!(array![[1., e], [e, 1.]], k, epsilon = 1e-10);
    }

    #[test]
    fn test_matern52_value() {
        let x = array![[0.], [1.]];
        let k = Matern52Kernel::new(1.).value(&x, &x);
        let s = 5f64.sqrt();
        let e = (1. + s + 5. / 3.) * (-s).exp();
        assert_abs_diff_eq!(array![[1., e], [e, 1.]], k, epsilon = 1e-10);
    }

    #[test]
    fn test_scale_kernel() {
        let x = array![[0., 1.], [0.5, 0.2], [1., 1.]];
        let kernel = ScaleKernel::new(RbfKernel::new(0.3)).with_outputscale(2.5);
        let expected = RbfKernel::new(0.3).value(&x, &x).mapv(|v| 2.5 * v);
        assert_abs_diff_eq!(expected, kernel.value(&x, &x), epsilon = 1e-10);
        assert_abs_diff_eq!(array![2.5, 2.5, 2.5], kernel.diag(&x), epsilon = 1e-10);
        assert_eq!(2, kernel.n_params());
        let names: Vec<String> = kernel.hyperparameters().into_iter().map(|h| h.0).collect();
        assert_eq!(vec!["outputscale", "lengthscale"], names);
    }

    #[test]
    fn test_default_values() {
        let kernel = ScaledRbfKernel::<f64>::default();
        assert_abs_diff_eq!(std::f64::consts::LN_2, kernel.outputscale(), epsilon = 1e-12);
        assert_abs_diff_eq!(std::f64::consts::LN_2, kernel.base().lengthscale(), epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_lengthscale_is_nan() {
        assert!(RbfKernel::<f64>::new(-1.).raw_params()[0].is_nan());
    }

    macro_rules! test_kernel_gradients {
        ($name:ident, $kernel:expr) => {
            paste! {
                #[test]
                fn [<test_ $name _raw_gradients>]() {
                    let x = array![[0.1, 0.3], [0.4, -0.2], [1.2, 0.7], [-0.5, 0.9]];
                    let n = x.nrows();
                    let weights = Array::linspace(0.5, 2., n * n).into_shape((n, n)).unwrap();
                    let kernel = $kernel;
                    let grads = kernel.raw_gradients(&x);
                    assert_eq!(kernel.n_params(), grads.len());

                    let f = |raw: &Vec<f64>| -> f64 {
                        let mut k = kernel.clone();
                        k.set_raw_params(&Array1::from(raw.clone()));
                        (k.value(&x, &x) * &weights).sum()
                    };
                    let fd = kernel.raw_params().to_vec().central_diff(&f);
                    for (i, g) in grads.iter().enumerate() {
                        assert_abs_diff_eq!((g * &weights).sum(), fd[i], epsilon = 1e-6);
                    }
                }
            }
        };
    }

    test_kernel_gradients!(rbf, RbfKernel::new(0.7));
    test_kernel_gradients!(matern52, Matern52Kernel::new(0.7));
    test_kernel_gradients!(scaled_rbf, ScaleKernel::new(RbfKernel::new(0.4)).with_outputscale(1.3));
    test_kernel_gradients!(
        scaled_matern52,
        ScaleKernel::new(Matern52Kernel::new(1.1)).with_outputscale(0.2)
    );

    #[test]
    fn test_display() {
        let kernel = ScaleKernel::new(RbfKernel::new(2.)).with_outputscale(3.);
        let s = kernel.to_string();
        assert!(s.starts_with("ScaleKernel(outputscale="));
        assert!(s.contains(", RbfKernel(lengthscale="));
    }
}
