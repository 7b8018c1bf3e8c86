use gpfit_doe::{Grid, Random, SamplingMethod};
use ndarray::arr2;

fn main() {
    let xlimits = arr2(&[[0., 1.], [-10., 10.]]);
    let n = 9;

    println!("Take {n} samples in");
    println!("{xlimits}\n");

    println!("*** using grid sampling");
    let samples = Grid::new(&xlimits).sample(n);
    println!("{samples}\n");

    println!("*** using random sampling");
    let samples = Random::new(&xlimits).sample(n);
    println!("{samples}\n");
}
