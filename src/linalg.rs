use log::{trace, warn};
use nalgebra::{DMatrix, DVector};

use crate::error::{EdoError, Result};

/// Lower-triangular `L` with `v = L * L^T` for a symmetric positive
/// semi-definite `v`.
///
/// Pivots whose magnitude stays within `tol * max(1, max|v_ii|)` are treated as
/// zero and produce a zero column; the entries below such a pivot must vanish
/// within the same tolerance. A negative pivot beyond the tolerance means the
/// matrix is not positive semi-definite.
pub fn cholesky(v: &DMatrix<f64>, tol: f64) -> Result<DMatrix<f64>> {
    let n = v.nrows();
    if v.ncols() != n {
        return Err(EdoError::Numerical(format!(
            "covariance must be square, got {}x{}",
            n,
            v.ncols()
        )));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(EdoError::Numerical(
            "covariance has non-finite entries".to_string(),
        ));
    }
    let scale = (0..n).map(|i| v[(i, i)].abs()).fold(1.0f64, f64::max);
    let eps = tol * scale;
    for i in 0..n {
        for j in 0..i {
            if (v[(i, j)] - v[(j, i)]).abs() > eps.max(f64::EPSILON * scale) {
                return Err(EdoError::Numerical(format!(
                    "covariance is not symmetric at ({i}, {j})"
                )));
            }
        }
    }

    let mut l = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        let mut pivot = v[(j, j)];
        for k in 0..j {
            pivot -= l[(j, k)] * l[(j, k)];
        }
        if pivot < -eps {
            return Err(EdoError::Numerical(format!(
                "covariance is not positive semi-definite (pivot {pivot:e} at {j})"
            )));
        }
        if pivot <= eps {
            for i in j + 1..n {
                let mut residual = v[(i, j)];
                for k in 0..j {
                    residual -= l[(i, k)] * l[(j, k)];
                }
                if residual.abs() > eps {
                    return Err(EdoError::Numerical(format!(
                        "covariance is not positive semi-definite (zero pivot at {j} \
                         with residual {residual:e})"
                    )));
                }
            }
            if pivot < 0.0 {
                warn!("clamped negative pivot {pivot:e} at {j} to zero (tolerance {eps:e})");
            } else if pivot > 0.0 {
                trace!("treating pivot {pivot:e} at {j} as zero (tolerance {eps:e})");
            }
            continue;
        }
        let d = pivot.sqrt();
        l[(j, j)] = d;
        for i in j + 1..n {
            let mut s = v[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / d;
        }
    }
    Ok(l)
}

/// `mean + l * t`, row by row.
pub(crate) fn affine(mean: &DVector<f64>, l: &DMatrix<f64>, t: &[f64]) -> Vec<f64> {
    let n = mean.len();
    (0..n)
        .map(|i| {
            let mut x = mean[i];
            for (k, &tk) in t.iter().enumerate().take(i + 1) {
                x += l[(i, k)] * tk;
            }
            x
        })
        .collect()
}
