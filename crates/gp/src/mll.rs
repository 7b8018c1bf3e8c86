//! Exact marginal log-likelihood used as GP training objective.
//!
//! Given training data `(X, y)`, mean `m`, kernel `k` and noise variance `s2`:
//!
//! `mll = log Normal(y | m(X), K + s2 I) / n`, `K = k(X, X)`
//!
//! Gradients wrt raw parameters are computed analytically with `a = (K + s2 I)^-1 (y - m(X))`:
//! * kernel or noise parameter `t`: `0.5 tr((a a^T - (K + s2 I)^-1) d(K + s2 I)/dt) / n`
//! * mean parameter `t`: `a^T dm(X)/dt / n`

use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::likelihood::GaussianLikelihood;
use crate::mean_models::MeanModel;
use crate::utils::{cholesky_inverse, cholesky_logdet, cholesky_solve, cholesky_with_jitter};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

/// Exact marginal log-likelihood of a GP prior with gaussian likelihood
#[derive(Debug)]
pub struct ExactMarginalLogLikelihood<'a, F: Float, Mean: MeanModel<F>, K: Kernel<F>> {
    mean: &'a Mean,
    kernel: &'a K,
    likelihood: &'a GaussianLikelihood<F>,
}

/// Intermediate terms shared by value and gradient computations
struct MllTerms<F: Float> {
    /// Cholesky factor of K + s2 I
    chol: Array2<F>,
    /// (K + s2 I)^-1 (y - m(X)) as a (n, 1) matrix
    alpha: Array2<F>,
    value: F,
}

impl<'a, F: Float, Mean: MeanModel<F>, K: Kernel<F>> ExactMarginalLogLikelihood<'a, F, Mean, K> {
    /// Constructor given the GP prior components
    pub fn new(mean: &'a Mean, kernel: &'a K, likelihood: &'a GaussianLikelihood<F>) -> Self {
        ExactMarginalLogLikelihood {
            mean,
            kernel,
            likelihood,
        }
    }

    /// Number of raw parameters ordered as mean, kernel then likelihood parameters
    pub fn n_params(&self) -> usize {
        self.mean.n_params() + self.kernel.n_params() + self.likelihood.n_params()
    }

    fn terms(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<MllTerms<F>> {
        if x.nrows() != y.len() || x.nrows() == 0 {
            return Err(GpError::InvalidValueError(format!(
                "expected non empty training data with matching sizes, got x {:?} and y ({},)",
                x.dim(),
                y.len()
            )));
        }
        let n = F::cast(x.nrows());
        let noise = self.likelihood.noise();
        let mut kxx = self.kernel.value(x, x);
        kxx.diag_mut().mapv_inplace(|v| v + noise);
        let chol = cholesky_with_jitter(&kxx)?;

        let residuals = (y - &self.mean.value(x)).insert_axis(Axis(1));
        let alpha = cholesky_solve(&chol, &residuals)?;
        let fit = residuals.t().dot(&alpha)[[0, 0]];
        let two_pi = F::cast(2. * std::f64::consts::PI);
        let value = -F::cast(0.5) * (fit + cholesky_logdet(&chol) + n * two_pi.ln()) / n;
        if !value.is_finite() {
            return Err(GpError::LikelihoodComputationError(format!(
                "marginal log-likelihood is not finite ({value})"
            )));
        }
        Ok(MllTerms { chol, alpha, value })
    }

    /// Marginal log-likelihood value divided by the number of training points
    pub fn value(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<F> {
        Ok(self.terms(x, y)?.value)
    }

    /// Marginal log-likelihood value and its gradient wrt raw parameters
    pub fn value_and_gradient(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<(F, Array1<F>)> {
        let MllTerms { chol, alpha, value } = self.terms(x, y)?;
        let n = F::cast(x.nrows());
        let half = F::cast(0.5);

        // a a^T - (K + s2 I)^-1
        let w = alpha.dot(&alpha.t()) - cholesky_inverse(&chol)?;
        let alpha = alpha.column(0);

        let mut grad = Array1::zeros(self.n_params());
        let mut i = 0;
        for dm in self.mean.raw_gradients(x) {
            grad[i] = alpha.dot(&dm) / n;
            i += 1;
        }
        for dk in self.kernel.raw_gradients(x) {
            grad[i] = half * (&w * &dk).sum() / n;
            i += 1;
        }
        grad[i] = half * w.diag().sum() * self.likelihood.raw_noise_gradient() / n;

        Ok((value, grad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::MultivariateNormal;
    use crate::kernels::{Matern52Kernel, RbfKernel, ScaleKernel};
    use crate::mean_models::ConstantMean;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::{array, s, Array};

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array::linspace(0., 1., 12).insert_axis(Axis(1));
        let y = x
            .column(0)
            .mapv(|v| (2. * std::f64::consts::PI * v).sin() + 0.1 * (17. * v).cos());
        (x, y)
    }

    #[test]
    fn test_mll_value_is_normalized_log_prob() {
        let (x, y) = training_data();
        let mean = ConstantMean::new(0.3);
        let kernel = ScaleKernel::new(RbfKernel::new(0.2)).with_outputscale(1.5);
        let likelihood = GaussianLikelihood::new(0.05);
        let mll = ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood);

        let mut cov = kernel.value(&x, &x);
        cov.diag_mut().mapv_inplace(|v| v + 0.05);
        let mvn = MultivariateNormal::new(mean.value(&x), cov).unwrap();
        let expected = mvn.log_prob(&y).unwrap() / 12.;
        assert_abs_diff_eq!(expected, mll.value(&x, &y).unwrap(), epsilon = 1e-10);
    }

    #[test]
    fn test_mll_gradient() {
        let (x, y) = training_data();
        let mean = ConstantMean::new(0.3);
        let kernel = ScaleKernel::new(RbfKernel::new(0.2)).with_outputscale(1.5);
        let likelihood = GaussianLikelihood::new(0.05);
        let mll = ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood);
        let (_, grad) = mll.value_and_gradient(&x, &y).unwrap();
        assert_eq!(4, grad.len());

        let raw0 = vec![
            mean.raw_params()[0],
            kernel.raw_params()[0],
            kernel.raw_params()[1],
            likelihood.raw_params()[0],
        ];
        let f = |raw: &Vec<f64>| -> f64 {
            let (mut m, mut k, mut l) = (mean.clone(), kernel.clone(), likelihood);
            m.set_raw_params(&array![raw[0]]);
            k.set_raw_params(&array![raw[1], raw[2]]);
            l.set_raw_params(&array![raw[3]]);
            ExactMarginalLogLikelihood::new(&m, &k, &l)
                .value(&x, &y)
                .unwrap()
        };
        let fd = raw0.central_diff(&f);
        for i in 0..4 {
            assert_abs_diff_eq!(fd[i], grad[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mll_gradient_matern() {
        let (x, y) = training_data();
        let mean = ConstantMean::new(-0.1);
        let kernel = ScaleKernel::new(Matern52Kernel::new(0.5));
        let likelihood = GaussianLikelihood::default();
        let mll = ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood);
        let (_, grad) = mll.value_and_gradient(&x, &y).unwrap();

        let mut raw0 = Array1::zeros(4);
        raw0[0] = mean.raw_params()[0];
        raw0.slice_mut(s![1..3]).assign(&kernel.raw_params());
        raw0[3] = likelihood.raw_params()[0];
        let f = |raw: &Vec<f64>| -> f64 {
            let (mut m, mut k, mut l) = (mean.clone(), kernel.clone(), likelihood);
            m.set_raw_params(&array![raw[0]]);
            k.set_raw_params(&array![raw[1], raw[2]]);
            l.set_raw_params(&array![raw[3]]);
            ExactMarginalLogLikelihood::new(&m, &k, &l)
                .value(&x, &y)
                .unwrap()
        };
        let fd = raw0.to_vec().central_diff(&f);
        for i in 0..4 {
            assert_abs_diff_eq!(fd[i], grad[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mll_size_mismatch() {
        let mean = ConstantMean::new(0.);
        let kernel = ScaleKernel::new(RbfKernel::<f64>::default());
        let likelihood = GaussianLikelihood::default();
        let mll = ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood);
        assert!(mll.value(&array![[0.], [1.]], &array![1.]).is_err());
    }

    #[test]
    fn test_mll_nan_is_error() {
        let mean = ConstantMean::new(f64::NAN);
        let kernel = ScaleKernel::new(RbfKernel::<f64>::default());
        let likelihood = GaussianLikelihood::default();
        let mll = ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood);
        assert!(mll.value(&array![[0.], [1.]], &array![1., 2.]).is_err());
    }
}
