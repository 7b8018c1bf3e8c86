use gpfit_doe::{Grid, SamplingMethod};
use gpfit_gp::metrics::coverage;
use gpfit_gp::SimpleGp;
use linfa::prelude::*;
use ndarray::{array, concatenate, Array, Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn sine(x: &Array2<f64>) -> Array1<f64> {
    x.column(0).mapv(|v| (2. * std::f64::consts::PI * v).sin())
}

fn main() {
    let xt = Grid::new(&array![[0., 1.]]).sample(100);
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let yt = sine(&xt) + Array::random_using(100, Normal::new(0., 0.2).unwrap(), &mut rng);

    println!("Train GP on noisy sine at {} points", xt.nrows());
    let gp = SimpleGp::params()
        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
        .expect("GP fitting");
    for step in gp.history().iter().step_by(10) {
        println!("Iter {} - Loss: {:.3}", step.iteration, step.loss);
    }
    println!("{gp}");

    let xtest = Array::linspace(0., 1., 11).insert_axis(Axis(1));
    let ytest = sine(&xtest);
    let (ypred, yvar) = gp.predict_valvar(&xtest).expect("GP prediction");

    println!("Compute prediction errors (x, err(x), sigma(x))");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest,
            (ypred - ytest).insert_axis(Axis(1)),
            yvar.mapv(|v| v.sqrt()).insert_axis(Axis(1))
        ]
    );

    let predictive = gp.predictive(&xt).expect("GP prediction");
    println!("Training data coverage: {}", coverage(&predictive, &yt));
}
