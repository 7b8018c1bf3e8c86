use crate::errors::{GpError, Result};
use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use log::warn;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2, Zip};

/// Number of jitter increases tried when a Cholesky factorization fails
pub(crate) const CHOLESKY_MAX_TRIES: usize = 3;

/// Computes squared euclidean distances between each row of x and each row of z
/// resulting in a 2d array of shape (nrows(x), nrows(z));
/// *Panics* if x and z have not the same column numbers
pub fn pairwise_sq_distances<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    z: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    assert!(x.ncols() == z.ncols());

    let (x, z) = (x.view(), z.view());
    let mut result = Array2::zeros((x.nrows(), z.nrows()));
    Zip::from(result.rows_mut())
        .and(x.rows())
        .par_for_each(|mut row, xi| {
            Zip::from(&mut row).and(z.rows()).for_each(|d, zj| {
                *d = Zip::from(&xi)
                    .and(&zj)
                    .fold(F::zero(), |acc, &a, &b| acc + (a - b) * (a - b));
            });
        });
    result
}

/// Initial jitter added to the diagonal when a Cholesky factorization fails
fn default_jitter<F: Float>() -> F {
    if std::mem::size_of::<F>() == 4 {
        F::cast(1e-6)
    } else {
        F::cast(1e-8)
    }
}

/// Lower Cholesky factor of a symmetric positive definite matrix.
///
/// When the factorization fails, a jitter is added to the diagonal
/// and multiplied by 10 at each retry.
pub(crate) fn cholesky_with_jitter<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    if let Ok(l) = a.cholesky() {
        return Ok(l);
    }
    let mut jitter = default_jitter::<F>();
    for _ in 0..CHOLESKY_MAX_TRIES {
        let mut jittered = a.to_owned();
        jittered.diag_mut().mapv_inplace(|v| v + jitter);
        match jittered.cholesky() {
            Ok(l) => {
                warn!("Covariance matrix not positive definite, added jitter {jitter} to the diagonal");
                return Ok(l);
            }
            Err(_) => jitter *= F::cast(10.),
        }
    }
    Err(GpError::LikelihoodComputationError(format!(
        "covariance matrix not positive definite even with jitter {}",
        jitter / F::cast(10.)
    )))
}

/// Solves `A x = b` given the lower Cholesky factor `l` of `A`
pub(crate) fn cholesky_solve<F: Float>(
    l: &Array2<F>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    let y = l.solve_triangular(b, UPLO::Lower)?;
    let x = l.t().solve_triangular_into(y, UPLO::Upper)?;
    Ok(x)
}

/// Inverse of `A` given the lower Cholesky factor `l` of `A`
pub(crate) fn cholesky_inverse<F: Float>(l: &Array2<F>) -> Result<Array2<F>> {
    let inv = cholesky_solve(l, &Array2::eye(l.nrows()))?;
    // symmetrize to wash out round-off
    Ok((&inv + &inv.t()).mapv(|v| v * F::cast(0.5)))
}

/// `log det(A)` given the lower Cholesky factor `l` of `A`
pub(crate) fn cholesky_logdet<F: Float>(l: &Array2<F>) -> F {
    l.diag().mapv(|v| v.ln()).sum() * F::cast(2.)
}

/// Checks that all values are finite
pub(crate) fn check_finite<F: Float>(
    name: &str,
    x: &ArrayBase<impl Data<Elem = F>, impl ndarray::Dimension>,
) -> Result<()> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GpError::InvalidValueError(format!(
            "{name} contains non finite values"
        )))
    }
}

/// Sum of squared values along rows, ie squared norms of columns
pub(crate) fn col_sq_norms<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
    a.mapv(|v| v * v).sum_axis(Axis(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_pairwise_sq_distances() {
        let x = array![[0., 0.], [1., 2.]];
        let z = array![[1., 0.], [0., 0.], [3., 4.]];
        assert_abs_diff_eq!(
            array![[1., 0., 25.], [4., 5., 8.]],
            pairwise_sq_distances(&x, &z),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_cholesky_solve_and_inverse() {
        let a = array![[4., 2., 0.6], [2., 5., 1.], [0.6, 1., 3.]];
        let l = cholesky_with_jitter(&a).unwrap();
        assert_abs_diff_eq!(a, l.dot(&l.t()), epsilon = 1e-10);

        let b = array![[1.], [2.], [3.]];
        let x = cholesky_solve(&l, &b).unwrap();
        assert_abs_diff_eq!(b, a.dot(&x), epsilon = 1e-10);

        let inv = cholesky_inverse(&l).unwrap();
        assert_abs_diff_eq!(Array2::<f64>::eye(3), a.dot(&inv), epsilon = 1e-10);

        let det: f64 = 4. * (5. * 3. - 1.) - 2. * (2. * 3. - 0.6) + 0.6 * (2. - 5. * 0.6);
        assert_abs_diff_eq!(det.ln(), cholesky_logdet(&l), epsilon = 1e-10);
    }

    #[test]
    fn test_cholesky_jitter_on_singular_matrix() {
        // rank one matrix
        let a = array![[1., 1.], [1., 1.]];
        let l = cholesky_with_jitter(&a).unwrap();
        assert_abs_diff_eq!(a, l.dot(&l.t()), epsilon = 1e-6);
    }

    #[test]
    fn test_cholesky_failure() {
        let a = array![[1., 0.], [0., -1.]];
        assert!(cholesky_with_jitter(&a).is_err());
    }

    #[test]
    fn test_check_finite() {
        assert!(check_finite("x", &array![1., 2.]).is_ok());
        assert!(check_finite("x", &array![[1., f64::NAN]]).is_err());
    }
}
