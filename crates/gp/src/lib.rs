//! This library implements exact [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with hyperparameters trained by gradient descent on the exact marginal log-likelihood.
//!
//! A GP prior is made of a mean model (see [`mean_models`]) and a covariance kernel (see [`kernels`]),
//! observations are related to latent values through a [`GaussianLikelihood`].
//! Positive hyperparameters are optimized as unconstrained raw values (see [`constraints`]).
//!
//! GP regression is implemented by [ExactGp] parameterized by [GpParams].
//! Posterior queries return a [MultivariateNormal] distribution.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod constraints;
mod distribution;
mod errors;
pub mod kernels;
mod likelihood;
pub mod mean_models;
pub mod metrics;
mod mll;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use distribution::*;
pub use errors::*;
pub use likelihood::*;
pub use mll::*;
pub use optimization::*;
pub use parameters::*;
pub use utils::pairwise_sq_distances;
