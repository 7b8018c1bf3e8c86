//! A module for constraints mapping unconstrained raw parameters to hyperparameter values.
//!
//! Hyperparameters such as length scales, output scales or noise variances
//! have to stay positive. They are optimized through a raw value living in `R`
//! and mapped to the actual value with a softplus transform:
//! * positive: `value = softplus(raw)`,
//! * greater than `lb`: `value = lb + softplus(raw)`.

use crate::errors::{GpError, Result};
use linfa::Float;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Above this threshold softplus(x) is x up to machine precision
const SOFTPLUS_THRESHOLD: f64 = 20.;

/// `ln(1 + exp(x))` computed without overflow
pub fn softplus<F: Float>(x: F) -> F {
    if x > F::cast(SOFTPLUS_THRESHOLD) {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Inverse of [softplus], `y` has to be strictly positive
pub fn inv_softplus<F: Float>(y: F) -> F {
    if y > F::cast(SOFTPLUS_THRESHOLD) {
        y
    } else {
        // ln(exp(y) - 1) = y + ln(1 - exp(-y))
        y + (-(-y).exp_m1()).ln()
    }
}

/// Derivative of [softplus]
pub fn sigmoid<F: Float>(x: F) -> F {
    F::one() / (F::one() + (-x).exp())
}

/// Constraint applied to a raw parameter
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Constraint<F: Float> {
    /// Value is strictly positive
    Positive,
    /// Value is strictly greater than the given lower bound
    GreaterThan(F),
}

impl<F: Float> Constraint<F> {
    /// Lower bound of the constrained value
    pub fn lower_bound(&self) -> F {
        match self {
            Constraint::Positive => F::zero(),
            Constraint::GreaterThan(lb) => *lb,
        }
    }

    /// Map a raw value to the constrained value
    pub fn transform(&self, raw: F) -> F {
        self.lower_bound() + softplus(raw)
    }

    /// Map a constrained value back to its raw value
    pub fn inverse_transform(&self, value: F) -> Result<F> {
        let lb = self.lower_bound();
        if !value.is_finite() || value <= lb {
            return Err(GpError::InvalidValueError(format!(
                "value {value} has to be finite and greater than {lb}"
            )));
        }
        Ok(inv_softplus(value - lb))
    }

    /// Derivative of the constrained value wrt the raw value
    pub fn derivative(&self, raw: F) -> F {
        sigmoid(raw)
    }
}

impl<F: Float> fmt::Display for Constraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Constraint::Positive => write!(f, "Positive"),
            Constraint::GreaterThan(lb) => write!(f, "GreaterThan({lb})"),
        }
    }
}
