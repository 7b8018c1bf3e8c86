//! Multivariate normal distribution returned by GP posterior queries.

use crate::errors::{GpError, Result};
use crate::utils::{cholesky_logdet, cholesky_with_jitter};
use linfa::Float;
use linfa_linalg::triangular::*;
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Multivariate normal distribution given by its mean vector and covariance matrix
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct MultivariateNormal<F: Float> {
    mean: Array1<F>,
    covariance: Array2<F>,
}

impl<F: Float> MultivariateNormal<F> {
    /// Constructor given a (n,) mean and a (n, n) covariance
    pub fn new(mean: Array1<F>, covariance: Array2<F>) -> Result<Self> {
        let n = mean.len();
        if covariance.dim() != (n, n) {
            return Err(GpError::InvalidValueError(format!(
                "covariance shape {:?} does not match mean length {}",
                covariance.dim(),
                n
            )));
        }
        Ok(MultivariateNormal { mean, covariance })
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether the distribution has no component
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Mean vector
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Covariance matrix
    pub fn covariance(&self) -> &Array2<F> {
        &self.covariance
    }

    /// Marginal variances, clamped at zero as round-off may make them slightly negative
    pub fn variance(&self) -> Array1<F> {
        self.covariance
            .diag()
            .mapv(|v| if v < F::zero() { F::zero() } else { v })
    }

    /// Marginal standard deviations
    pub fn stddev(&self) -> Array1<F> {
        self.variance().mapv(|v| v.sqrt())
    }

    /// Confidence region as (lower, upper) bounds: mean -/+ 2 standard deviations
    pub fn confidence_region(&self) -> (Array1<F>, Array1<F>) {
        let two_std = self.stddev().mapv(|v| v * F::cast(2.));
        (&self.mean - &two_std, &self.mean + &two_std)
    }

    /// Log probability density of `y`
    pub fn log_prob(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<F> {
        if y.len() != self.len() {
            return Err(GpError::InvalidValueError(format!(
                "expected a vector of length {}, got {}",
                self.len(),
                y.len()
            )));
        }
        let l = cholesky_with_jitter(&self.covariance)?;
        let r = (y - &self.mean).insert_axis(Axis(1));
        let z = l.solve_triangular(&r, UPLO::Lower)?;
        let n = F::cast(self.len());
        let two_pi = F::cast(2. * std::f64::consts::PI);
        Ok(-F::cast(0.5) * (z.mapv(|v| v * v).sum() + cholesky_logdet(&l) + n * two_pi.ln()))
    }

    /// Draw `n_traj` samples as a (len, n_traj) matrix
    pub fn sample<R: Rng>(&self, n_traj: usize, rng: &mut R) -> Result<Array2<F>> {
        let l = cholesky_with_jitter(&self.covariance)?;
        let eps = Array::random_using((self.len(), n_traj), StandardNormal, rng)
            .mapv(|v: f64| F::cast(v));
        Ok(l.dot(&eps) + &self.mean.view().insert_axis(Axis(1)))
    }
}
