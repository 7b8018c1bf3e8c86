/*!
This library implements the designs of experiments used to draw the inputs
of a Gaussian Process regression: a regular grid and a uniform random design.

A design is a way to generate a set of points within a sample space `xlimits`.
The sample space is defined as a 2D ndarray `(nx, 2)`, specifying lower bound and upper bound
of each `nx` components of the samples `x`.

Example:
```
use gpfit_doe::{Grid, Random, SamplingMethod};
use ndarray::arr2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Sample space is [0., 1.], samples are 1-dimensional.
let xlimits = arr2(&[[0., 1.]]);
// 100 points regularly spaced, both bounds included
let samples = Grid::new(&xlimits).sample(100);
// or else randomly with random generator for reproducibility
let samples = Random::new(&xlimits).with_rng(Xoshiro256Plus::seed_from_u64(42)).sample(100);
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod grid;
mod random;
mod traits;

pub use grid::*;
pub use random::*;
pub use traits::*;
