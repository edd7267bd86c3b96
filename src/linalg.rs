//! Dense linear algebra for convolution matrices.
//!
//! Provides the square [`Matrix`] type used to hold the Toeplitz convolution
//! operator of an AR calcium model, together with the operations needed to
//! apply and invert it.
//!
//! # Matrix Storage
//!
//! Matrices are stored in row-major order in a flat `Vec<f64>`. For an N×N matrix:
//! - Element at row i, column j is stored at index `i * N + j`
//! - This layout is cache-friendly for the row-wise matrix-vector product
//!
//! # Numerical Stability
//!
//! [`Matrix::inverse`] inverts lower-triangular input by forward substitution,
//! so a triangular matrix is singular only if a diagonal entry is zero. Other
//! matrices go through Gauss-Jordan elimination with partial pivoting. Both
//! paths report failure instead of returning a matrix with non-finite entries.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

/// Pivots with magnitude below this are treated as zero.
const PIVOT_EPSILON: f64 = 1e-15;

/// Errors that can occur during matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// No usable pivot was found (matrix is singular to working precision)
    Singular,

    /// A non-finite value appeared during elimination
    NumericalInstability,

    /// Matrix dimensions incompatible
    DimensionMismatch,
}

impl fmt::Display for LinalgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular => write!(f, "matrix is singular"),
            Self::NumericalInstability => write!(f, "non-finite value during elimination"),
            Self::DimensionMismatch => write!(f, "matrix dimensions do not match"),
        }
    }
}

impl core::error::Error for LinalgError {}

/// A square matrix stored in row-major order.
///
/// # Example
///
/// ```
/// use calcitrace::linalg::Matrix;
///
/// let eye = Matrix::identity(2);
/// assert_eq!(eye.get(0, 0), 1.0);
/// assert_eq!(eye.get(0, 1), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    /// Matrix data in row-major order
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::DimensionMismatch` if `data.len() != n * n`.
    pub fn from_row_major(n: usize, data: Vec<f64>) -> Result<Self, LinalgError> {
        if data.len() != n * n {
            return Err(LinalgError::DimensionMismatch);
        }
        Ok(Self { n, data })
    }

    /// Create an n×n zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Create an n×n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Get element at row i, column j.
    ///
    /// # Panics
    ///
    /// Panics if i >= n or j >= n.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "Index out of bounds");
        self.data[i * self.n + j]
    }

    /// Set element at row i, column j.
    ///
    /// # Panics
    ///
    /// Panics if i >= n or j >= n.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.n && j < self.n, "Index out of bounds");
        self.data[i * self.n + j] = value;
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Column `j` copied into a new vector.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.n).map(|i| self.get(i, j)).collect()
    }

    /// Underlying row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// True if every element above the diagonal is zero.
    pub fn is_lower_triangular(&self) -> bool {
        (0..self.n).all(|i| self.row(i)[i + 1..].iter().all(|&v| v == 0.0))
    }

    /// Compute matrix multiplication: self × other.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::DimensionMismatch` if the dimensions differ.
    pub fn matmul(&self, other: &Self) -> Result<Self, LinalgError> {
        if self.n != other.n {
            return Err(LinalgError::DimensionMismatch);
        }
        let n = self.n;
        let mut result = Self::zeros(n);
        for i in 0..n {
            for k in 0..n {
                let a_ik = self.data[i * n + k];
                if a_ik == 0.0 {
                    continue;
                }
                for j in 0..n {
                    result.data[i * n + j] += a_ik * other.data[k * n + j];
                }
            }
        }
        Ok(result)
    }

    /// Matrix-vector product: self × x.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::DimensionMismatch` if `x.len() != n`.
    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>, LinalgError> {
        if x.len() != self.n {
            return Err(LinalgError::DimensionMismatch);
        }
        Ok((0..self.n)
            .map(|i| self.row(i).iter().zip(x).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Invert the matrix.
    ///
    /// Lower-triangular matrices (such as convolution matrices) are inverted
    /// by forward substitution without pivoting. Anything else uses
    /// Gauss-Jordan elimination with partial pivoting.
    ///
    /// # Errors
    ///
    /// - `LinalgError::Singular` if a triangular diagonal entry is zero, or
    ///   a general column has no pivot above `1e-15`
    /// - `LinalgError::NumericalInstability` if any entry of the result is not finite
    ///
    /// # Performance
    ///
    /// O(n³) time, O(n²) extra memory.
    pub fn inverse(&self) -> Result<Self, LinalgError> {
        let inv = if self.is_lower_triangular() {
            self.lower_triangular_inverse()?
        } else {
            self.gauss_jordan_inverse()?
        };

        if inv.iter().any(|v| !v.is_finite()) {
            return Err(LinalgError::NumericalInstability);
        }

        Ok(Self { n: self.n, data: inv })
    }

    /// Row i of L⁻¹: `x[i][j] = (δᵢⱼ - Σ_{j≤k<i} L[i][k]·x[k][j]) / L[i][i]`.
    fn lower_triangular_inverse(&self) -> Result<Vec<f64>, LinalgError> {
        let n = self.n;
        let mut inv = vec![0.0; n * n];

        for i in 0..n {
            let diag = self.data[i * n + i];
            if !diag.is_finite() {
                return Err(LinalgError::NumericalInstability);
            }
            if diag == 0.0 {
                return Err(LinalgError::Singular);
            }

            for j in 0..=i {
                let mut acc = if i == j { 1.0 } else { 0.0 };
                for k in j..i {
                    acc -= self.data[i * n + k] * inv[k * n + j];
                }
                inv[i * n + j] = acc / diag;
            }
        }

        Ok(inv)
    }

    fn gauss_jordan_inverse(&self) -> Result<Vec<f64>, LinalgError> {
        let n = self.n;
        let mut a = self.data.clone();
        let mut inv = Self::identity(n).data;

        for col in 0..n {
            // Partial pivoting: largest magnitude in this column at or below the diagonal
            let mut pivot_row = col;
            let mut pivot_mag = libm::fabs(a[col * n + col]);
            for r in (col + 1)..n {
                let mag = libm::fabs(a[r * n + col]);
                if mag > pivot_mag {
                    pivot_mag = mag;
                    pivot_row = r;
                }
            }

            if !pivot_mag.is_finite() {
                return Err(LinalgError::NumericalInstability);
            }
            if pivot_mag < PIVOT_EPSILON {
                return Err(LinalgError::Singular);
            }

            if pivot_row != col {
                swap_rows(&mut a, n, col, pivot_row);
                swap_rows(&mut inv, n, col, pivot_row);
            }

            let pivot = a[col * n + col];
            for j in 0..n {
                a[col * n + j] /= pivot;
                inv[col * n + j] /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a[r * n + col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[r * n + j] -= factor * a[col * n + j];
                    inv[r * n + j] -= factor * inv[col * n + j];
                }
            }
        }

        Ok(inv)
    }
}

fn swap_rows(data: &mut [f64], n: usize, a: usize, b: usize) {
    for j in 0..n {
        data.swap(a * n + j, b * n + j);
    }
}
