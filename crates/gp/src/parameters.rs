use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::likelihood::GaussianLikelihood;
use crate::mean_models::MeanModel;
use crate::optimization::OptimizerKind;
use linfa::{Float, ParamGuard};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Default learning rate of the hyperparameters optimizer
pub const GP_DEFAULT_LEARNING_RATE: f64 = 0.1;
/// Default number of training iterations
pub const GP_DEFAULT_N_ITERS: usize = 50;

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize, Mean: Serialize, K: Serialize",
        deserialize = "F: Deserialize<'de>, Mean: Deserialize<'de>, K: Deserialize<'de>"
    ))
)]
pub struct GpValidParams<F: Float, Mean: MeanModel<F>, K: Kernel<F>> {
    /// Mean model of the GP prior
    pub(crate) mean: Mean,
    /// Covariance kernel of the GP prior
    pub(crate) kernel: K,
    /// Observation noise model
    pub(crate) likelihood: GaussianLikelihood<F>,
    /// Gradient-based optimizer used for training
    pub(crate) optimizer: OptimizerKind,
    /// Optimizer learning rate
    pub(crate) learning_rate: F,
    /// Momentum factor, only used by SGD
    pub(crate) momentum: F,
    /// Number of training iterations
    pub(crate) n_iters: usize,
}

impl<F: Float, Mean: MeanModel<F> + Default, K: Kernel<F> + Default> Default
    for GpValidParams<F, Mean, K>
{
    fn default() -> GpValidParams<F, Mean, K> {
        GpValidParams::new(Mean::default(), K::default())
    }
}

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>> GpValidParams<F, Mean, K> {
    fn new(mean: Mean, kernel: K) -> Self {
        GpValidParams {
            mean,
            kernel,
            likelihood: GaussianLikelihood::default(),
            optimizer: OptimizerKind::default(),
            learning_rate: F::cast(GP_DEFAULT_LEARNING_RATE),
            momentum: F::zero(),
            n_iters: GP_DEFAULT_N_ITERS,
        }
    }

    /// Get mean model
    pub fn mean(&self) -> &Mean {
        &self.mean
    }

    /// Get covariance kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Get gaussian likelihood
    pub fn likelihood(&self) -> &GaussianLikelihood<F> {
        &self.likelihood
    }

    /// Get optimizer kind
    pub fn optimizer(&self) -> OptimizerKind {
        self.optimizer
    }

    /// Get learning rate
    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    /// Get momentum factor
    pub fn momentum(&self) -> F {
        self.momentum
    }

    /// Get number of training iterations
    pub fn n_iters(&self) -> usize {
        self.n_iters
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.ExactGp.html).
pub struct GpParams<F: Float, Mean: MeanModel<F>, K: Kernel<F>>(GpValidParams<F, Mean, K>);

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>> GpParams<F, Mean, K> {
    /// A constructor for GP parameters given mean model and kernel
    pub fn new(mean: Mean, kernel: K) -> GpParams<F, Mean, K> {
        Self(GpValidParams::new(mean, kernel))
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F, Mean, K>) -> Self {
        Self(params.clone())
    }

    /// Set mean model.
    pub fn mean(mut self, mean: Mean) -> Self {
        self.0.mean = mean;
        self
    }

    /// Set covariance kernel.
    pub fn kernel(mut self, kernel: K) -> Self {
        self.0.kernel = kernel;
        self
    }

    /// Set gaussian likelihood.
    pub fn likelihood(mut self, likelihood: GaussianLikelihood<F>) -> Self {
        self.0.likelihood = likelihood;
        self
    }

    /// Set the optimizer used to train hyperparameters.
    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.0.optimizer = optimizer;
        self
    }

    /// Set optimizer learning rate, has to be strictly positive.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set SGD momentum factor, has to be in [0, 1).
    pub fn momentum(mut self, momentum: F) -> Self {
        self.0.momentum = momentum;
        self
    }

    /// Set the number of training iterations.
    ///
    /// With 0 iterations the GP is conditioned on training data with
    /// its initial hyperparameters.
    pub fn n_iters(mut self, n_iters: usize) -> Self {
        self.0.n_iters = n_iters;
        self
    }
}

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>> From<GpValidParams<F, Mean, K>>
    for GpParams<F, Mean, K>
{
    fn from(valid: GpValidParams<F, Mean, K>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>> ParamGuard for GpParams<F, Mean, K> {
    type Checked = GpValidParams<F, Mean, K>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let lr = self.0.learning_rate;
        if !lr.is_finite() || lr <= F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`learning_rate` should be finite and strictly positive, got {lr}"
            )));
        }
        let momentum = self.0.momentum;
        if !(momentum >= F::zero() && momentum < F::one()) {
            return Err(GpError::InvalidValueError(format!(
                "`momentum` should be in [0, 1), got {momentum}"
            )));
        }
        let raw_params = [
            ("mean", self.0.mean.raw_params()),
            ("kernel", self.0.kernel.raw_params()),
            ("likelihood", self.0.likelihood.raw_params()),
        ];
        for (name, raw) in raw_params.iter() {
            if raw.iter().any(|v| !v.is_finite()) {
                return Err(GpError::InvalidValueError(format!(
                    "invalid {name} hyperparameters, check values against their constraints"
                )));
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{RbfKernel, ScaleKernel, ScaledRbfKernel};
    use crate::mean_models::ConstantMean;
    use approx::assert_abs_diff_eq;

    type Params = GpParams<f64, ConstantMean<f64>, ScaledRbfKernel<f64>>;

    fn params() -> Params {
        GpParams::new(ConstantMean::default(), ScaleKernel::default())
    }

    #[test]
    fn test_default_params() {
        let valid = params().check().unwrap();
        assert_eq!(OptimizerKind::Adam, valid.optimizer());
        assert_eq!(50, valid.n_iters());
        assert_abs_diff_eq!(0.1, valid.learning_rate());
        assert_abs_diff_eq!(0., valid.momentum());
    }

    #[test]
    fn test_invalid_learning_rate() {
        assert!(params().learning_rate(0.).check().is_err());
        assert!(params().learning_rate(-0.1).check().is_err());
        assert!(params().learning_rate(f64::INFINITY).check().is_err());
    }

    #[test]
    fn test_invalid_momentum() {
        assert!(params().momentum(1.).check().is_err());
        assert!(params().momentum(-0.5).check().is_err());
        assert!(params().momentum(0.9).check().is_ok());
    }

    #[test]
    fn test_invalid_hyperparameters() {
        let kernel = ScaleKernel::new(RbfKernel::new(-1.));
        assert!(params().kernel(kernel).check().is_err());
        let likelihood = GaussianLikelihood::new(1e-5);
        assert!(params().likelihood(likelihood).check().is_err());
    }

    #[test]
    fn test_zero_iterations_allowed() {
        assert_eq!(0, params().n_iters(0).check().unwrap().n_iters());
    }
}
