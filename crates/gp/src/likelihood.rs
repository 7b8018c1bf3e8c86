//! Gaussian likelihood relating latent GP values to noisy observations.

use crate::constraints::Constraint;
use crate::distribution::MultivariateNormal;
use crate::errors::Result;
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lower bound of the noise variance
pub const GAUSSIAN_NOISE_LOWER_BOUND: f64 = 1e-4;

/// Homoskedastic gaussian likelihood `y = f(x) + e`, `e ~ Normal(0, noise)`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct GaussianLikelihood<F: Float> {
    raw_noise: F,
    noise_constraint: Constraint<F>,
}

impl<F: Float> Default for GaussianLikelihood<F> {
    fn default() -> Self {
        GaussianLikelihood {
            raw_noise: F::zero(),
            noise_constraint: Constraint::GreaterThan(F::cast(GAUSSIAN_NOISE_LOWER_BOUND)),
        }
    }
}

impl<F: Float> GaussianLikelihood<F> {
    /// Constructor given the initial noise variance
    pub fn new(noise: F) -> Self {
        Self::default().with_noise(noise)
    }

    /// Set noise variance value
    ///
    /// A value below the constraint lower bound is reported when GP parameters are checked.
    pub fn with_noise(mut self, noise: F) -> Self {
        self.raw_noise = self
            .noise_constraint
            .inverse_transform(noise)
            .unwrap_or(F::nan());
        self
    }

    /// Set the noise constraint, the noise value is kept when compatible
    pub fn with_noise_constraint(mut self, constraint: Constraint<F>) -> Self {
        let noise = self.noise();
        self.noise_constraint = constraint;
        self.with_noise(noise)
    }

    /// Current noise variance
    pub fn noise(&self) -> F {
        self.noise_constraint.transform(self.raw_noise)
    }

    /// Raw noise value
    pub fn raw_params(&self) -> Array1<F> {
        Array1::from_elem(1, self.raw_noise)
    }

    /// Set raw noise value
    pub fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>) {
        self.raw_noise = raw[0];
    }

    /// Number of raw parameters
    pub fn n_params(&self) -> usize {
        1
    }

    /// Hyperparameter (name, value) pairs
    pub fn hyperparameters(&self) -> Vec<(String, F)> {
        vec![("noise".to_string(), self.noise())]
    }

    /// Derivative of the noise variance wrt its raw value
    pub fn raw_noise_gradient(&self) -> F {
        self.noise_constraint.derivative(self.raw_noise)
    }

    /// Marginal distribution of observations given the latent distribution `f`:
    /// noise variance is added to the covariance diagonal.
    pub fn marginal(&self, f: &MultivariateNormal<F>) -> Result<MultivariateNormal<F>> {
        let noise = self.noise();
        let mut covariance = f.covariance().to_owned();
        covariance.diag_mut().mapv_inplace(|v| v + noise);
        MultivariateNormal::new(f.mean().to_owned(), covariance)
    }
}

impl<F: Float> fmt::Display for GaussianLikelihood<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GaussianLikelihood(noise={})", self.noise())
    }
}
