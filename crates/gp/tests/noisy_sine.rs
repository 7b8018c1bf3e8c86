use approx::assert_abs_diff_eq;
use gpfit_doe::{Grid, Random, SamplingMethod};
use gpfit_gp::kernels::{Matern52Kernel, ScaleKernel};
use gpfit_gp::mean_models::ConstantMean;
use gpfit_gp::metrics::{coverage, rmse};
use gpfit_gp::{GaussianLikelihood, GpParams, SimpleGp};
use linfa::prelude::*;
use ndarray::{array, Array, Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

const PI: f64 = std::f64::consts::PI;

fn sine(x: &Array2<f64>) -> Array1<f64> {
    x.column(0).mapv(|v| (2. * PI * v).sin())
}

fn noisy(y: Array1<f64>, std: f64, seed: u64) -> Array1<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let n = y.len();
    y + Array::random_using(n, Normal::new(0., std).unwrap(), &mut rng)
}

#[test]
fn test_noisy_sine_regression() {
    let xt = Grid::new(&array![[0., 1.]]).sample(100);
    let yt = noisy(sine(&xt), 0.2, 42);

    let gp = SimpleGp::params()
        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
        .expect("GP fitted");

    let history = gp.history();
    assert_eq!(50, history.len());
    assert!(history.last().unwrap().loss < history[0].loss);
    for (i, step) in history.iter().enumerate() {
        assert_eq!(i + 1, step.iteration);
        assert_eq!(4, step.hyperparameters.len());
    }

    let xtest = Grid::new(&array![[0., 1.]]).sample(51);
    let predictive = gp.predictive(&xtest).expect("GP prediction");
    assert_eq!(51, predictive.len());
    let (lower, upper) = predictive.confidence_region();
    assert!(lower.iter().zip(upper.iter()).all(|(lo, up)| lo < up));
    assert!(rmse(predictive.mean(), &sine(&xtest)) < 0.2);

    let train_predictive = gp.predictive(&xt).expect("GP prediction");
    assert!(coverage(&train_predictive, &yt) >= 0.8);
}

#[test]
fn test_random_design_matern() {
    let xt = Random::seeded(&array![[0., 1.]], 0).sample(80);
    let yt = noisy(sine(&xt), 0.2, 1);

    let gp = GpParams::new(
        ConstantMean::default(),
        ScaleKernel::new(Matern52Kernel::default()),
    )
    .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
    .expect("GP fitted");

    assert!(gp.loss() < gp.history()[0].loss);
    let predictive = gp.predictive(&xt).expect("GP prediction");
    assert!(coverage(&predictive, &yt) >= 0.8);
}

#[test]
fn test_posterior_reverts_to_prior() {
    let xt = Grid::new(&array![[0., 1.]]).sample(30);
    let yt = noisy(sine(&xt), 0.2, 7);
    let gp = SimpleGp::params()
        .likelihood(GaussianLikelihood::new(0.04))
        .n_iters(20)
        .fit(&Dataset::new(xt, yt))
        .expect("GP fitted");

    let far = Array::linspace(20., 30., 5).insert_axis(Axis(1));
    let (mean, var) = gp.predict_valvar(&far).expect("GP prediction");
    let outputscale = gp.hyperparameter("kernel.outputscale").unwrap();
    let noise = gp.hyperparameter("likelihood.noise").unwrap();
    let prior_var = outputscale + noise;
    let constant = gp.hyperparameter("mean.constant").unwrap();
    assert_abs_diff_eq!(Array1::from_elem(5, prior_var), var, epsilon = 1e-8);
    assert_abs_diff_eq!(Array1::from_elem(5, constant), mean, epsilon = 1e-8);
}

#[test]
fn test_single_precision() {
    let xt = Grid::new(&array![[0f32, 1.]]).sample(50);
    let yt = xt.column(0).mapv(|v| (2. * std::f32::consts::PI * v).sin());

    let gp = SimpleGp::<f32>::params()
        .n_iters(30)
        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
        .expect("GP fitted");
    assert!(gp.loss() < gp.history()[0].loss);
    let ypred = gp.predict(&xt).expect("GP prediction");
    assert!(rmse(&ypred, &yt) < 0.2);
}
