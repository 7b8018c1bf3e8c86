use crate::config::DesignArg;
use anyhow::{Context, Result};
use gpfit_doe::{Grid, Random, SamplingMethod};
use ndarray::{array, Array, Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

/// Noiseless function to approximate: `sin(2 pi x)`
pub fn sine(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array1<f64> {
    x.column(0).mapv(|v| (2. * std::f64::consts::PI * v).sin())
}

/// Training data `(x, sin(2 pi x) + e)` with `e ~ Normal(0, noise_std^2)`,
/// `x` being drawn in [0, 1] with the given design.
pub fn training_data(
    n: usize,
    noise_std: f64,
    design: DesignArg,
    rng: &mut Xoshiro256Plus,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let xlimits = array![[0., 1.]];
    let xt = match design {
        DesignArg::Grid => Grid::new(&xlimits).sample(n),
        DesignArg::Random => {
            let doe = Random::from_rng(&xlimits, rng.clone());
            // independent stream for the noise
            rng.jump();
            doe.sample(n)
        }
    };
    let normal = Normal::new(0., noise_std).context("invalid noise standard deviation")?;
    let yt = sine(&xt) + Array::random_using(n, normal, rng);
    Ok((xt, yt))
}

/// Test inputs on a regular grid over [0, 1]
pub fn test_inputs(n: usize) -> Array2<f64> {
    Grid::new(&array![[0., 1.]]).sample(n)
}
