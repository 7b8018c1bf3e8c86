use criterion::{criterion_group, criterion_main, Criterion};
use gpfit_doe::{Grid, SamplingMethod};
use gpfit_gp::SimpleGp;
use linfa::prelude::{Dataset, Fit};
use ndarray::{array, Array, Array1};
use ndarray_npy::{read_npy, write_npy};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn criterion_gp(c: &mut Criterion) {
    let nts = [50, 100, 200];

    let mut group = c.benchmark_group("gp");
    group.sample_size(20);
    for nt in nts {
        let xt = Grid::new(&array![[0., 1.]]).sample(nt);
        let prefix = "gp";
        let yfilename = format!("{prefix}_yt_{nt}.npy");
        let yt: Array1<f64> = match read_npy(&yfilename) {
            Ok(yt) => yt,
            Err(_) => {
                let mut rng = Xoshiro256Plus::seed_from_u64(42);
                let noise = Array::random_using(nt, Normal::new(0., 0.2).unwrap(), &mut rng);
                let yt = xt.column(0).mapv(|v| (2. * std::f64::consts::PI * v).sin()) + noise;
                write_npy(&yfilename, &yt).expect("cannot save yt");
                yt
            }
        };

        group.bench_function(format!("gp fit {nt}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    SimpleGp::params()
                        .n_iters(50)
                        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                        .expect("GP fit error"),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gp);
criterion_main!(benches);
