//! A module for metrics to evaluate Gaussian Process models performances:
//! * calibration of the predictive distribution ([`coverage`]),
//! * accuracy of the predictive mean ([`rmse`]),
//! * k-fold cross-validation Q2 predictive coefficient ([`PredictScore`]).

use linfa::dataset::Dataset;
use linfa::{
    traits::{Fit, Predict, PredictInplace},
    Float, ParamGuard,
};
use log::warn;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Zip};

use crate::distribution::MultivariateNormal;
use crate::kernels::Kernel;
use crate::mean_models::MeanModel;
use crate::{ExactGp, GpError, GpParams};

/// Fraction of `y` values lying in the confidence region of `dist`
/// (mean -/+ 2 standard deviations).
///
/// *Panics* if `y` length does not match `dist` one
pub fn coverage<F: Float>(
    dist: &MultivariateNormal<F>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    assert_eq!(dist.len(), y.len(), "values should match distribution length");
    if y.is_empty() {
        return F::zero();
    }
    let (lower, upper) = dist.confidence_region();
    let inside = Zip::from(y).and(&lower).and(&upper).fold(0, |acc, &v, &lo, &up| {
        if lo <= v && v <= up {
            acc + 1
        } else {
            acc
        }
    });
    F::cast(inside) / F::cast(y.len())
}

/// Root mean squared error between predictions and reference values
///
/// *Panics* if `pred` and `y` lengths do not match
pub fn rmse<F: Float>(
    pred: &ArrayBase<impl Data<Elem = F>, Ix1>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    assert_eq!(
        pred.len(),
        y.len(),
        "predictions and values lengths should match"
    );
    if y.is_empty() {
        return F::zero();
    }
    let sse = Zip::from(pred)
        .and(y)
        .fold(F::zero(), |acc, &p, &v| acc + (p - v) * (p - v));
    (sse / F::cast(y.len())).sqrt()
}

/// A trait for Q2 predictive coefficient cross validation score
pub trait PredictScore<F, ER, P, O>
where
    F: Float,
    ER: std::error::Error + From<linfa::error::Error>,
    P: Fit<Array2<F>, Array1<F>, ER, Object = O> + ParamGuard,
    O: PredictInplace<Array2<F>, Array1<F>>,
{
    /// Return the training data (xt, yt)
    fn training_data(&self) -> &(Array2<F>, Array1<F>);

    /// Return the model parameters
    fn params(&self) -> P;

    /// Compute quality metric Q2 with kfold cross validation
    ///
    /// Q2 is undefined when training outputs are all equal (zero total sum
    /// of squares): NaN is returned and a warning is logged.
    ///
    /// **Panics** if `kfold` is not in `[2, n]`, `n` being the number of training points.
    fn q2_score(&self, kfold: usize) -> F {
        let (xt, yt) = self.training_data();
        assert!(
            kfold >= 2 && kfold <= xt.nrows(),
            "kfold should be in [2, {}], got {kfold}",
            xt.nrows()
        );
        let dataset = Dataset::new(xt.to_owned(), yt.to_owned());
        let yt_mean = yt.mean().unwrap_or(F::zero());
        // Predictive Residual Sum of Squares
        let mut press = F::zero();
        // Total Sum of Squares
        let mut tss = F::zero();
        for (train, valid) in dataset.fold(kfold).into_iter() {
            let params = self.params();
            let model: O = params
                .fit(&train)
                .expect("cross-validation: sub model fitted");
            let pred = model.predict(valid.records());
            press += (valid.targets() - pred).mapv(|v| v * v).sum();
            tss += (valid.targets() - yt_mean).mapv(|v| v * v).sum();
        }
        if tss == F::zero() {
            warn!("Q2 score undefined: training outputs are constant");
            return F::nan();
        }
        F::one() - press / tss
    }

    /// Q2 predictive coefficient with Leave-One-Out Cross-Validation
    fn looq2_score(&self) -> F {
        self.q2_score(self.training_data().0.nrows())
    }
}

impl<F, Mean, K> PredictScore<F, GpError, GpParams<F, Mean, K>, Self> for ExactGp<F, Mean, K>
where
    F: Float,
    Mean: MeanModel<F>,
    K: Kernel<F>,
{
    fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    fn params(&self) -> GpParams<F, Mean, K> {
        GpParams::from(self.params.clone())
    }
}
