use anyhow::{ensure, Result};
use clap::{Parser, ValueEnum};
use gpfit_gp::OptimizerKind;
use std::path::PathBuf;

/// Environment variable controlling log filtering
pub const GPFIT_LOG: &str = "GPFIT_LOG";

/// Covariance kernel of the GP prior, always scaled by a trained outputscale
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KernelArg {
    /// Squared exponential kernel
    Rbf,
    /// Matern 5/2 kernel
    Matern52,
}

/// Design of the training inputs over [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DesignArg {
    /// Regular grid including both ends
    Grid,
    /// Uniform random points
    Random,
}

/// Fit an exact GP regression on a noisy sine and plot its predictive distribution
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Number of training points
    #[arg(long, default_value_t = 100)]
    pub n_train: usize,
    /// Number of test points where the predictive distribution is computed
    #[arg(long, default_value_t = 51)]
    pub n_test: usize,
    /// Standard deviation of the gaussian noise added to training outputs
    #[arg(long, default_value_t = 0.2)]
    pub noise_std: f64,
    /// Number of training iterations
    #[arg(long, default_value_t = 50)]
    pub iters: usize,
    /// Optimizer learning rate
    #[arg(long, default_value_t = 0.1)]
    pub lr: f64,
    /// Momentum factor of the sgd optimizer
    #[arg(long, default_value_t = 0.)]
    pub momentum: f64,
    /// Hyperparameters optimizer: adam or sgd
    #[arg(long, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,
    /// Covariance kernel
    #[arg(long, value_enum, default_value_t = KernelArg::Rbf)]
    pub kernel: KernelArg,
    /// Training inputs design
    #[arg(long, value_enum, default_value_t = DesignArg::Grid)]
    pub design: DesignArg,
    /// Random seed for reproducibility, drawn from entropy otherwise
    #[arg(long)]
    pub seed: Option<u64>,
    /// Output SVG plot file
    #[arg(long, default_value = "gp_regression.svg")]
    pub plot: PathBuf,
    /// Optional output JSON summary file
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl Args {
    /// Checks values clap does not check by itself
    pub fn validate(&self) -> Result<()> {
        ensure!(self.n_train > 0, "--n-train should be at least 1");
        ensure!(self.n_test > 0, "--n-test should be at least 1");
        ensure!(
            self.noise_std.is_finite() && self.noise_std >= 0.,
            "--noise-std should be a finite non negative value, got {}",
            self.noise_std
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["gpfit"]);
        assert_eq!(100, args.n_train);
        assert_eq!(51, args.n_test);
        assert_eq!(50, args.iters);
        assert_eq!(OptimizerKind::Adam, args.optimizer);
        assert_eq!(KernelArg::Rbf, args.kernel);
        assert_eq!(DesignArg::Grid, args.design);
        assert_eq!(PathBuf::from("gp_regression.svg"), args.plot);
        assert!(args.seed.is_none());
        assert!(args.summary.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "gpfit",
            "--optimizer",
            "sgd",
            "--kernel",
            "matern52",
            "--design",
            "random",
            "--seed",
            "42",
            "--summary",
            "summary.json",
        ]);
        assert_eq!(OptimizerKind::Sgd, args.optimizer);
        assert_eq!(KernelArg::Matern52, args.kernel);
        assert_eq!(DesignArg::Random, args.design);
        assert_eq!(Some(42), args.seed);
        assert_eq!(Some(PathBuf::from("summary.json")), args.summary);
    }

    #[test]
    fn test_invalid_args() {
        assert!(Args::try_parse_from(["gpfit", "--optimizer", "lbfgs"]).is_err());
        assert!(Args::parse_from(["gpfit", "--n-train", "0"])
            .validate()
            .is_err());
        assert!(Args::parse_from(["gpfit", "--noise-std=-1"])
            .validate()
            .is_err());
    }
}
