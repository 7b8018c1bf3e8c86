use anyhow::{Context, Result};
use gpfit_gp::kernels::Kernel;
use gpfit_gp::mean_models::MeanModel;
use gpfit_gp::metrics::{coverage, rmse};
use gpfit_gp::{ExactGp, MultivariateNormal, TrainingStep};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Outcome of a GP regression run
#[derive(Debug, Serialize)]
pub struct Summary {
    /// Number of training points
    pub n_train: usize,
    /// Number of test points
    pub n_test: usize,
    /// Trained model description
    pub model: String,
    /// Loss at trained hyperparameters
    pub loss: f64,
    /// Trained hyperparameters
    pub hyperparameters: Vec<(String, f64)>,
    /// Fraction of training outputs inside the predictive confidence region
    pub train_coverage: f64,
    /// Fraction of noiseless test outputs inside the predictive confidence region
    pub test_coverage: f64,
    /// RMSE of the predictive mean against the noiseless function at test points
    pub test_rmse: f64,
    /// Per-iteration training history
    pub history: Vec<TrainingStep<f64>>,
}

impl Summary {
    /// Summary of `gp` trained on `(xt, yt)` with predictive distributions
    /// at training inputs (`train_predictive`) and test inputs (`test_predictive`)
    /// where the noiseless function takes `ytrue` values.
    pub fn new<Mean: MeanModel<f64>, K: Kernel<f64>>(
        gp: &ExactGp<f64, Mean, K>,
        (xt, yt): (&Array2<f64>, &Array1<f64>),
        train_predictive: &MultivariateNormal<f64>,
        test_predictive: &MultivariateNormal<f64>,
        ytrue: &Array1<f64>,
    ) -> Self {
        Summary {
            n_train: xt.nrows(),
            n_test: test_predictive.len(),
            model: gp.to_string(),
            loss: gp.loss(),
            hyperparameters: gp.hyperparameters(),
            train_coverage: coverage(train_predictive, yt),
            test_coverage: coverage(test_predictive, ytrue),
            test_rmse: rmse(test_predictive.mean(), ytrue),
            history: gp.history().to_vec(),
        }
    }

    /// Writes the summary as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("cannot create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("cannot write summary to {}", path.display()))?;
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Trained {}", self.model)?;
        writeln!(f, "Loss: {:.3}", self.loss)?;
        for (name, value) in &self.hyperparameters {
            writeln!(f, "  {name}: {value:.4}")?;
        }
        writeln!(
            f,
            "Training data coverage: {:.1}% ({} points)",
            100. * self.train_coverage,
            self.n_train
        )?;
        writeln!(
            f,
            "Noiseless function coverage: {:.1}% ({} points)",
            100. * self.test_coverage,
            self.n_test
        )?;
        write!(f, "RMSE against noiseless function: {:.4}", self.test_rmse)
    }
}

/// One log line per training iteration
pub fn iteration_line(step: &TrainingStep<f64>, n_iters: usize) -> String {
    let lengthscale = step.hyperparameter("kernel.lengthscale").unwrap_or(f64::NAN);
    let noise = step.hyperparameter("likelihood.noise").unwrap_or(f64::NAN);
    format!(
        "Iter {}/{} - Loss: {:.3}   lengthscale: {:.3}   noise: {:.3}",
        step.iteration, n_iters, step.loss, lengthscale, noise
    )
}
