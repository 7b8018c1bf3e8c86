use crate::distribution::MultivariateNormal;
use crate::errors::{GpError, Result};
use crate::kernels::*;
use crate::likelihood::GaussianLikelihood;
use crate::mean_models::*;
use crate::mll::ExactMarginalLogLikelihood;
use crate::optimization::make_optimizer;
use crate::parameters::{GpParams, GpValidParams};
use crate::utils::{
    check_finite, cholesky_solve, cholesky_with_jitter, col_sq_norms, pairwise_sq_distances,
};

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use linfa_linalg::triangular::*;
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;
use ndarray_stats::QuantileExt;

use log::{debug, info, warn};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Record of one training iteration
///
/// Hyperparameters are the values used to compute the loss,
/// i.e. the values before the optimizer update of this iteration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct TrainingStep<F: Float> {
    /// Iteration number starting from 1
    pub iteration: usize,
    /// Negative marginal log-likelihood divided by the number of training points
    pub loss: F,
    /// Named hyperparameter values
    pub hyperparameters: Vec<(String, F)>,
}

impl<F: Float> TrainingStep<F> {
    /// Value of the named hyperparameter if any
    pub fn hyperparameter(&self, name: &str) -> Option<F> {
        find_hyperparameter(&self.hyperparameters, name)
    }
}

/// An exact GP regression model with a gaussian likelihood.
///
/// Observations are modeled as:
///
/// `y(x) = f(x) + e`, `f ~ GP(m(x), k(x, x'))`, `e ~ Normal(0, noise)`
///
/// where:
/// * `m(x)` is the mean model of the GP prior
/// * `k(x, x')` is the covariance kernel
/// * `noise` is the observation noise variance of the gaussian likelihood
///
/// Hyperparameters of `m`, `k` and the noise are trained by a gradient-based optimizer
/// minimizing the negative exact marginal log-likelihood of the training data
/// (see [`ExactMarginalLogLikelihood`]).
///
/// Posterior distributions are computed from the training data and the
/// current hyperparameters on each call.
///
/// # Features
///
/// ## serializable
///
/// The `serializable` feature enables the serialization of GP models using the [`serde crate`](https://serde.rs/).
///
/// # Example
///
/// ```no_run
/// use gpfit_gp::SimpleGp;
/// use linfa::prelude::*;
/// use ndarray::{Array, Axis};
///
/// // training data
/// let xt = Array::linspace(0., 1., 20).insert_axis(Axis(1));
/// let yt = xt.column(0).mapv(|v| (2. * std::f64::consts::PI * v).sin());
///
/// // GP with constant mean and scaled RBF kernel
/// let gp = SimpleGp::<f64>::params()
///     .n_iters(50)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP trained");
///
/// // Use trained model for making predictions
/// let xtest = Array::linspace(0., 1., 51).insert_axis(Axis(1));
/// let predictive = gp.predictive(&xtest).expect("GP prediction");
/// let (lower, upper) = predictive.confidence_region();
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize, Mean: Serialize, K: Serialize",
        deserialize = "F: Deserialize<'de>, Mean: Deserialize<'de>, K: Deserialize<'de>"
    ))
)]
pub struct ExactGp<F: Float, Mean: MeanModel<F>, K: Kernel<F>> {
    /// Trained mean model
    mean: Mean,
    /// Trained covariance kernel
    kernel: K,
    /// Trained gaussian likelihood
    likelihood: GaussianLikelihood<F>,
    /// Loss at trained hyperparameters
    loss: F,
    /// Training history, one step per iteration
    history: Vec<TrainingStep<F>>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F, Mean, K>,
}

/// GP with constant mean and scaled RBF kernel
pub type SimpleGp<F> = GpParams<F, ConstantMean<F>, ScaledRbfKernel<F>>;

impl<F: Float> SimpleGp<F> {
    /// Simple GP parameters constructor
    pub fn params() -> GpParams<F, ConstantMean<F>, ScaledRbfKernel<F>> {
        GpParams::new(ConstantMean::default(), ScaleKernel::default())
    }
}

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>> fmt::Display for ExactGp<F, Mean, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ExactGp(mean={}, kernel={}, likelihood={}, loss={})",
            self.mean, self.kernel, self.likelihood, self.loss,
        )
    }
}

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>> ExactGp<F, Mean, K> {
    /// Gp parameters contructor
    pub fn params<NewMean: MeanModel<F>, NewK: Kernel<F>>(
        mean: NewMean,
        kernel: NewK,
    ) -> GpParams<F, NewMean, NewK> {
        GpParams::new(mean, kernel)
    }

    /// Cholesky factor of `K(X, X) + noise I` and `(K(X, X) + noise I)^-1 (y - m(X))`
    /// for current hyperparameters
    fn conditioning(&self) -> Result<(Array2<F>, Array1<F>)> {
        let (xt, yt) = &self.training_data;
        let noise = self.likelihood.noise();
        let mut kxx = self.kernel.value(xt, xt);
        kxx.diag_mut().mapv_inplace(|v| v + noise);
        let chol = cholesky_with_jitter(&kxx)?;
        let residuals = (yt - &self.mean.value(xt)).insert_axis(Axis(1));
        let alpha = cholesky_solve(&chol, &residuals)?.remove_axis(Axis(1));
        Ok((chol, alpha))
    }

    /// Latent posterior mean at `x` and `L^-1 K(X, x)` where `L` is the Cholesky factor
    /// of training covariance
    fn posterior_terms(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array2<F>)> {
        self.check_input(x)?;
        let (chol, alpha) = self.conditioning()?;
        let kxt = self.kernel.value(x, &self.training_data.0);
        let mean = self.mean.value(x) + kxt.dot(&alpha);
        let v = chol.solve_triangular(&kxt.t(), UPLO::Lower)?;
        Ok((mean, v))
    }

    fn check_input(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        if x.ncols() != self.training_data.0.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "expected input points with {} components, got {}",
                self.training_data.0.ncols(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Posterior distribution of the latent function `f` at n given `x` points
    /// of nx components specified as a (n, nx) matrix.
    pub fn posterior(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<MultivariateNormal<F>> {
        let (mean, v) = self.posterior_terms(x)?;
        let cov = self.kernel.value(x, x) - v.t().dot(&v);
        // symmetrize to wash out round-off
        let cov = (&cov + &cov.t()).mapv(|c| c * F::cast(0.5));
        MultivariateNormal::new(mean, cov)
    }

    /// Posterior predictive distribution of observations at n given `x` points
    /// of nx components specified as a (n, nx) matrix.
    pub fn predictive(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<MultivariateNormal<F>> {
        self.likelihood.marginal(&self.posterior(x)?)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_input(x)?;
        let (_, alpha) = self.conditioning()?;
        let kxt = self.kernel.value(x, &self.training_data.0);
        Ok(self.mean.value(x) + kxt.dot(&alpha))
    }

    /// Predict variance of observations at n given `x` points of nx components
    /// specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) vector, only the diagonal of the covariance is computed.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let (_, v) = self.posterior_terms(x)?;
        Ok(self.observed_variance(x, &v))
    }

    /// Predict both output values and variance at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        let (mean, v) = self.posterior_terms(x)?;
        let var = self.observed_variance(x, &v);
        Ok((mean, var))
    }

    fn observed_variance(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>, v: &Array2<F>) -> Array1<F> {
        let noise = self.likelihood.noise();
        let var = self.kernel.diag(x) - col_sq_norms(v);
        // Variance might be slightly negative depending on
        // machine precision: set to zero in that case
        var.mapv(|s| if s < F::zero() { noise } else { s + noise })
    }

    /// Sample the latent posterior at `x` for `n_traj` trajectories.
    /// Returns a (n, n_traj) matrix.
    pub fn sample<R: Rng>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        self.posterior(x)?.sample(n_traj, rng)
    }

    /// Named hyperparameter values ordered as mean, kernel then likelihood ones
    pub fn hyperparameters(&self) -> Vec<(String, F)> {
        named_hyperparameters(&self.mean, &self.kernel, &self.likelihood)
    }

    /// Value of the named hyperparameter (ex: `kernel.lengthscale`)
    pub fn hyperparameter(&self, name: &str) -> Option<F> {
        find_hyperparameter(&self.hyperparameters(), name)
    }

    /// Training history
    pub fn history(&self) -> &[TrainingStep<F>] {
        &self.history
    }

    /// Loss at trained hyperparameters
    pub fn loss(&self) -> F {
        self.loss
    }

    /// Training dataset (input, output)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Trained mean model
    pub fn mean(&self) -> &Mean {
        &self.mean
    }

    /// Trained covariance kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Trained gaussian likelihood
    pub fn likelihood(&self) -> &GaussianLikelihood<F> {
        &self.likelihood
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.ncols(), 1)
    }
}

fn named_hyperparameters<F: Float, Mean: MeanModel<F>, K: Kernel<F>>(
    mean: &Mean,
    kernel: &K,
    likelihood: &GaussianLikelihood<F>,
) -> Vec<(String, F)> {
    let prefixed = |prefix: &str, hps: Vec<(String, F)>| {
        hps.into_iter()
            .map(|(name, v)| (format!("{prefix}.{name}"), v))
            .collect::<Vec<_>>()
    };
    let mut hps = prefixed("mean", mean.hyperparameters());
    hps.extend(prefixed("kernel", kernel.hyperparameters()));
    hps.extend(prefixed("likelihood", likelihood.hyperparameters()));
    hps
}

fn find_hyperparameter<F: Float>(hps: &[(String, F)], name: &str) -> Option<F> {
    hps.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
}

/// Concatenation of mean, kernel and likelihood raw parameters
fn raw_params<F: Float, Mean: MeanModel<F>, K: Kernel<F>>(
    mean: &Mean,
    kernel: &K,
    likelihood: &GaussianLikelihood<F>,
) -> Array1<F> {
    let mut raw = mean.raw_params().to_vec();
    raw.extend(kernel.raw_params().iter());
    raw.extend(likelihood.raw_params().iter());
    Array1::from_vec(raw)
}

fn set_raw_params<F: Float, Mean: MeanModel<F>, K: Kernel<F>>(
    raw: &Array1<F>,
    mean: &mut Mean,
    kernel: &mut K,
    likelihood: &mut GaussianLikelihood<F>,
) {
    let nm = mean.n_params();
    let nk = kernel.n_params();
    mean.set_raw_params(&raw.slice(s![..nm]));
    kernel.set_raw_params(&raw.slice(s![nm..nm + nk]));
    likelihood.set_raw_params(&raw.slice(s![nm + nk..]));
}

impl<F, D, Mean, K> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for ExactGp<F, Mean, K>
where
    F: Float,
    D: Data<Elem = F>,
    Mean: MeanModel<F>,
    K: Kernel<F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

impl<F: Float, Mean: MeanModel<F>, K: Kernel<F>, D: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError> for GpValidParams<F, Mean, K>
{
    type Object = ExactGp<F, Mean, K>;

    /// Fit GP hyperparameters by maximizing the exact marginal log-likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(GpError::InvalidValueError(
                "training data should not be empty".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(GpError::InvalidValueError(format!(
                "training inputs ({}) and outputs ({}) numbers do not match",
                x.nrows(),
                y.len()
            )));
        }
        check_finite("training inputs", x)?;
        check_finite("training outputs", y)?;

        let mut distances = pairwise_sq_distances(x, x);
        distances.diag_mut().fill(F::infinity());
        if let Ok(dmin) = distances.min() {
            if *dmin == F::zero() {
                warn!("Multiple training inputs have the same value (at least same row twice)");
            }
        }

        let mut mean = self.mean().clone();
        let mut kernel = self.kernel().clone();
        let mut likelihood = *self.likelihood();

        let mut raw = raw_params(&mean, &kernel, &likelihood);
        let mut optimizer = make_optimizer(
            self.optimizer(),
            self.learning_rate(),
            self.momentum(),
            raw.len(),
        );

        let n_iters = self.n_iters();
        let mut history = Vec::with_capacity(n_iters);
        let now = Instant::now();
        for iteration in 1..=n_iters {
            let mll = ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood);
            let (value, grad) = mll.value_and_gradient(x, y)?;
            let loss = -value;
            let hyperparameters = named_hyperparameters(&mean, &kernel, &likelihood);
            debug!(
                "Iter {iteration}/{n_iters} - Loss: {loss} hyperparameters: {:?}",
                hyperparameters
            );
            history.push(TrainingStep {
                iteration,
                loss,
                hyperparameters,
            });

            optimizer.step(&mut raw, &grad.mapv(|g| -g));
            set_raw_params(&raw, &mut mean, &mut kernel, &mut likelihood);
        }

        let loss = -ExactMarginalLogLikelihood::new(&mean, &kernel, &likelihood).value(x, y)?;
        info!(
            "GP trained in {n_iters} iterations ({} ms), loss = {loss}",
            now.elapsed().as_millis()
        );
        Ok(ExactGp {
            mean,
            kernel,
            likelihood,
            loss,
            history,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}
