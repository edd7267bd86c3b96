//! Toeplitz construction of the AR convolution matrix.
//!
//! For an AR(k) calcium model `c[t] = s[t] + g₁·c[t-1] + ... + g_k·c[t-k]`
//! the spike train follows from the calcium trace by `s = G·c`, where `G` is
//! the T×T lower-triangular Toeplitz matrix with first column
//! `[1, -g₁, ..., -g_k, 0, ..., 0]` and first row `[1, 0, ..., 0]`.

use alloc::vec;

use crate::error::DeconvError;
use crate::linalg::Matrix;

/// Builds the Toeplitz matrix with first column `col` and first row `row`.
///
/// `M[i][j] = col[i - j]` for `i >= j`, otherwise `row[j - i]`. The diagonal
/// comes from `col[0]`; `row[0]` is not used.
///
/// # Errors
///
/// Returns `DeconvError::ShapeMismatch` if the lengths differ or are zero.
///
/// # Example
///
/// ```
/// use calcitrace::toeplitz;
///
/// let m = toeplitz(&[1.0, 2.0, 3.0], &[1.0, 4.0, 5.0]).unwrap();
/// assert_eq!(m.row(0), &[1.0, 4.0, 5.0]);
/// assert_eq!(m.row(2), &[3.0, 2.0, 1.0]);
/// ```
pub fn toeplitz(col: &[f64], row: &[f64]) -> Result<Matrix, DeconvError> {
    if col.is_empty() || col.len() != row.len() {
        return Err(DeconvError::ShapeMismatch {
            column: col.len(),
            row: row.len(),
        });
    }

    let n = col.len();
    let mut m = Matrix::zeros(n);
    for i in 0..n {
        for j in 0..n {
            let value = if i >= j { col[i - j] } else { row[j - i] };
            m.set(i, j, value);
        }
    }
    Ok(m)
}

/// Builds the T×T convolution matrix `G` for AR coefficients `g`.
///
/// # Arguments
///
/// * `g` - AR coefficients, `g[i]` applies to lag `i + 1`
/// * `t` - Trace length T
///
/// # Errors
///
/// - `DeconvError::EmptyTrace` if `t == 0`
/// - `DeconvError::OrderTooLarge` if `g.len() >= t`
///
/// # Example
///
/// ```
/// use calcitrace::construct_g;
///
/// let g = construct_g(&[0.9], 3).unwrap();
/// assert_eq!(g.column(0), vec![1.0, -0.9, 0.0]);
/// assert_eq!(g.row(0), &[1.0, 0.0, 0.0]);
/// ```
pub fn construct_g(g: &[f64], t: usize) -> Result<Matrix, DeconvError> {
    check_order(g.len(), t)?;

    let mut col = vec![0.0; t];
    let mut row = vec![0.0; t];
    col[0] = 1.0;
    row[0] = 1.0;
    for (dst, &coef) in col[1..=g.len()].iter_mut().zip(g) {
        *dst = -coef;
    }

    toeplitz(&col, &row)
}

/// Validates model order against trace length.
pub(crate) fn check_order(order: usize, t: usize) -> Result<(), DeconvError> {
    if t == 0 {
        return Err(DeconvError::EmptyTrace);
    }
    if order >= t {
        return Err(DeconvError::OrderTooLarge { order, length: t });
    }
    Ok(())
}
