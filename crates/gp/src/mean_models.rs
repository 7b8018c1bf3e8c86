//! A module for mean models of the GP prior.
//!
//! The following models are implemented:
//! * zero,
//! * constant (trainable constant).

use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trait for mean models used in GP regression
///
/// Parameters are exposed as raw values to be optimized, see [`crate::constraints`].
pub trait MeanModel<F: Float>: Clone + fmt::Debug + fmt::Display + Sync {
    /// Compute the mean values of the GP prior for the given `x` data points
    /// specified as (n, nx) matrix. Returns a (n,) vector.
    fn value(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F>;

    /// Raw parameter values
    fn raw_params(&self) -> Array1<F>;

    /// Set raw parameter values, `raw` length has to be [`MeanModel::n_params`]
    fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>);

    /// Hyperparameter (name, value) pairs
    fn hyperparameters(&self) -> Vec<(String, F)>;

    /// Derivatives of the mean values at `x` wrt each raw parameter
    fn raw_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array1<F>>;

    /// Number of raw parameters
    fn n_params(&self) -> usize {
        self.raw_params().len()
    }
}

/// A zero function as mean of the GP
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ZeroMean();

impl<F: Float> MeanModel<F> for ZeroMean {
    fn value(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }

    fn raw_params(&self) -> Array1<F> {
        Array1::zeros(0)
    }

    fn set_raw_params(&mut self, _raw: &ArrayBase<impl Data<Elem = F>, Ix1>) {}

    fn hyperparameters(&self) -> Vec<(String, F)> {
        vec![]
    }

    fn raw_gradients(&self, _x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array1<F>> {
        vec![]
    }
}

impl fmt::Display for ZeroMean {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ZeroMean")
    }
}

/// A constant function as mean of the GP
///
/// `mean(x) = c`, `c` being optimized without constraint.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ConstantMean<F: Float> {
    constant: F,
}

impl<F: Float> ConstantMean<F> {
    /// Constructor given the initial constant
    pub fn new(constant: F) -> Self {
        ConstantMean { constant }
    }

    /// Current constant
    pub fn constant(&self) -> F {
        self.constant
    }
}

impl<F: Float> MeanModel<F> for ConstantMean<F> {
    /// mean(x) = [c, ..., c].T
    fn value(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.constant)
    }

    fn raw_params(&self) -> Array1<F> {
        Array1::from_elem(1, self.constant)
    }

    fn set_raw_params(&mut self, raw: &ArrayBase<impl Data<Elem = F>, Ix1>) {
        self.constant = raw[0];
    }

    fn hyperparameters(&self) -> Vec<(String, F)> {
        vec![("constant".to_string(), self.constant)]
    }

    /// dmean/dc = [1, ..., 1].T
    fn raw_gradients(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Vec<Array1<F>> {
        vec![Array1::ones(x.nrows())]
    }
}

impl<F: Float> fmt::Display for ConstantMean<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConstantMean(constant={})", self.constant)
    }
}
