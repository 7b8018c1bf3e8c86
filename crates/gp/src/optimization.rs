//! First-order optimizers used to train GP hyperparameters by minimizing
//! the negative marginal log-likelihood wrt raw parameters.

use linfa::Float;
use ndarray::{Array1, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Adam exponential decay rate of the first moment estimates
pub const ADAM_BETA1: f64 = 0.9;
/// Default Adam exponential decay rate of the second moment estimates
pub const ADAM_BETA2: f64 = 0.999;
/// Default Adam term added to the denominator for numerical stability
pub const ADAM_EPSILON: f64 = 1e-8;

/// Available gradient-based optimizers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum OptimizerKind {
    /// Adam with bias-corrected moment estimates
    #[default]
    Adam,
    /// Stochastic gradient descent with optional momentum
    Sgd,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptimizerKind::Adam => write!(f, "adam"),
            OptimizerKind::Sgd => write!(f, "sgd"),
        }
    }
}

impl std::str::FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd" => Ok(OptimizerKind::Sgd),
            _ => Err(format!("unknown optimizer '{s}', expected 'adam' or 'sgd'")),
        }
    }
}

/// A stateful optimizer updating parameters given the gradient of the objective to minimize
pub trait GradientOptimizer<F: Float> {
    /// Performs one update of `params` in place given `grad`,
    /// the gradient of the objective at `params`
    fn step(&mut self, params: &mut Array1<F>, grad: &Array1<F>);
}

/// Adam optimizer (Kingma & Ba, 2015)
#[derive(Clone, Debug)]
pub struct Adam<F: Float> {
    lr: F,
    beta1: F,
    beta2: F,
    eps: F,
    m: Array1<F>,
    v: Array1<F>,
    t: i32,
}

impl<F: Float> Adam<F> {
    /// Constructor given the learning rate and the number of parameters
    pub fn new(lr: F, n_params: usize) -> Self {
        Adam {
            lr,
            beta1: F::cast(ADAM_BETA1),
            beta2: F::cast(ADAM_BETA2),
            eps: F::cast(ADAM_EPSILON),
            m: Array1::zeros(n_params),
            v: Array1::zeros(n_params),
            t: 0,
        }
    }

    /// Set moment decay rates
    pub fn with_betas(mut self, beta1: F, beta2: F) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }
}

impl<F: Float> GradientOptimizer<F> for Adam<F> {
    fn step(&mut self, params: &mut Array1<F>, grad: &Array1<F>) {
        let (b1, b2) = (self.beta1, self.beta2);
        self.t += 1;
        let step_size = self.lr / (F::one() - b1.powi(self.t));
        let bias_correction2 = (F::one() - b2.powi(self.t)).sqrt();
        let eps = self.eps;

        Zip::from(params)
            .and(&mut self.m)
            .and(&mut self.v)
            .and(grad)
            .for_each(|p, m, v, &g| {
                *m = b1 * *m + (F::one() - b1) * g;
                *v = b2 * *v + (F::one() - b2) * g * g;
                *p -= step_size * *m / (v.sqrt() / bias_correction2 + eps);
            });
    }
}

/// Stochastic gradient descent with momentum
#[derive(Clone, Debug)]
pub struct Sgd<F: Float> {
    lr: F,
    momentum: F,
    velocity: Array1<F>,
}

impl<F: Float> Sgd<F> {
    /// Constructor given the learning rate, the momentum factor and the number of parameters
    pub fn new(lr: F, momentum: F, n_params: usize) -> Self {
        Sgd {
            lr,
            momentum,
            velocity: Array1::zeros(n_params),
        }
    }
}

impl<F: Float> GradientOptimizer<F> for Sgd<F> {
    fn step(&mut self, params: &mut Array1<F>, grad: &Array1<F>) {
        let (lr, momentum) = (self.lr, self.momentum);
        Zip::from(params)
            .and(&mut self.velocity)
            .and(grad)
            .for_each(|p, b, &g| {
                *b = momentum * *b + g;
                *p -= lr * *b;
            });
    }
}

/// Builds the optimizer of the given kind for `n_params` parameters
pub(crate) fn make_optimizer<F: Float>(
    kind: OptimizerKind,
    lr: F,
    momentum: F,
    n_params: usize,
) -> Box<dyn GradientOptimizer<F>> {
    match kind {
        OptimizerKind::Adam => Box::new(Adam::new(lr, n_params)),
        OptimizerKind::Sgd => Box::new(Sgd::new(lr, momentum, n_params)),
    }
}
