//! `gpfit` trains an exact GP regression on noisy observations of `sin(2 pi x)`,
//! prints the training progression and a summary, then renders the predictive
//! distribution as an SVG plot.
//!
//! The `Iter i/n` progression lines are printed from the recorded training
//! history once the fit returns. Live per-iteration output is available at
//! debug log level (`GPFIT_LOG=debug`).
//!
//! Log filtering is controlled by the `GPFIT_LOG` environment variable (default `info`).
mod config;
mod data;
mod plot;
mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use gpfit_gp::kernels::{Kernel, Matern52Kernel, RbfKernel, ScaleKernel};
use gpfit_gp::mean_models::ConstantMean;
use gpfit_gp::GpParams;
use linfa::prelude::{Dataset, Fit};
use log::info;
use ndarray::{Array1, Array2};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use config::{Args, KernelArg, GPFIT_LOG};
use summary::{iteration_line, Summary};

fn main() -> Result<()> {
    let env = Env::new().filter_or(GPFIT_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let args = Args::parse();
    args.validate()?;

    let mut rng = match args.seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    };
    let (xt, yt) = data::training_data(args.n_train, args.noise_std, args.design, &mut rng)?;
    info!(
        "Training data: {} points ({:?} design, noise std {})",
        xt.nrows(),
        args.design,
        args.noise_std
    );

    match args.kernel {
        KernelArg::Rbf => {
            let kernel = ScaleKernel::new(RbfKernel::default());
            run(&args, kernel, &xt, &yt)
        }
        KernelArg::Matern52 => {
            let kernel = ScaleKernel::new(Matern52Kernel::default());
            run(&args, kernel, &xt, &yt)
        }
    }
}

fn run<K: Kernel<f64>>(
    args: &Args,
    kernel: K,
    xt: &Array2<f64>,
    yt: &Array1<f64>,
) -> Result<()> {
    let gp = GpParams::<f64, _, K>::new(ConstantMean::default(), kernel)
        .optimizer(args.optimizer)
        .learning_rate(args.lr)
        .momentum(args.momentum)
        .n_iters(args.iters)
        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
        .context("GP training failed")?;

    for step in gp.history() {
        println!("{}", iteration_line(step, args.iters));
    }

    let xtest = data::test_inputs(args.n_test);
    let test_predictive = gp
        .predictive(&xtest)
        .context("GP prediction at test points failed")?;
    let train_predictive = gp
        .predictive(xt)
        .context("GP prediction at training points failed")?;

    let summary = Summary::new(
        &gp,
        (xt, yt),
        &train_predictive,
        &test_predictive,
        &data::sine(&xtest),
    );
    println!("{summary}");

    plot::plot_regression(&args.plot, (xt, yt), &xtest, &test_predictive)?;
    info!("Plot saved to {}", args.plot.display());

    if let Some(path) = &args.summary {
        summary.save(path)?;
        info!("Summary saved to {}", path.display());
    }
    Ok(())
}
