//! Forward convolution of spike trains into calcium traces.
//!
//! Under an AR(k) model the spike train and calcium trace are related by
//! `G·c = s`, where `G` is built by [`construct_g`]. This module solves for
//! `c` given `s`, and applies `G` in the other direction.
//!
//! # Solvers
//!
//! - [`Solver::Inverse`]: forms `G` explicitly, inverts it and multiplies.
//!   O(T³) time and O(T²) memory; the numerical reference.
//! - [`Solver::Banded`]: runs the AR recurrence
//!   `c[t] = s[t] + Σ gᵢ·c[t-i]` directly. O(T·k) time, no matrix.
//!
//! Both produce the same trace within floating-point tolerance.
//!
//! # Fallback
//!
//! When the solve fails numerically (singular pivot or non-finite output)
//! the trace falls back to a copy of `s`, and the returned [`Convolved`]
//! records this as [`Outcome::Passthrough`]. Callers must check the outcome
//! before assuming the trace differs from the input.
//!
//! # Example
//!
//! ```
//! use calcitrace::{convolve_g, Outcome, Solver};
//!
//! let s = [1.0, 0.0, 0.0, 0.0, 0.0];
//! let result = convolve_g(&s, &[0.9], Solver::Banded).unwrap();
//!
//! assert_eq!(result.outcome, Outcome::Solved);
//! assert!((result.calcium[4] - 0.6561).abs() < 1e-12);
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::error::DeconvError;
use crate::linalg::LinalgError;
use crate::model::ArModel;
use crate::toeplitz::{check_order, construct_g};

/// Strategy used to solve `G·c = s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Solver {
    /// Explicit inverse of the full Toeplitz matrix
    Inverse,
    /// AR recurrence exploiting the banded lower-triangular structure
    #[default]
    Banded,
}

/// How a trace was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The linear system was solved
    Solved,
    /// The solve failed; the trace is a copy of the input
    Passthrough(LinalgError),
}

/// Calcium trace with the outcome of the solve that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Convolved {
    /// Calcium trace c, same length as the spike train
    pub calcium: Vec<f64>,
    /// Whether `calcium` was computed or passed through
    pub outcome: Outcome,
}

impl Convolved {
    /// True if the trace is the untouched input.
    pub fn is_passthrough(&self) -> bool {
        matches!(self.outcome, Outcome::Passthrough(_))
    }
}

/// Convolves spike train `s` with the AR kernel given by `g`.
///
/// # Arguments
///
/// * `s` - Spike train of length T
/// * `g` - AR coefficients, `g.len() < T`
/// * `solver` - Solve strategy
///
/// # Errors
///
/// - `DeconvError::EmptyTrace` if `s` is empty
/// - `DeconvError::OrderTooLarge` if `g.len() >= s.len()`
///
/// Numerical failure is not an error; see [`Outcome::Passthrough`].
pub fn convolve_g(s: &[f64], g: &[f64], solver: Solver) -> Result<Convolved, DeconvError> {
    check_order(g.len(), s.len())?;
    log::debug!(
        "convolving {} samples with AR({}) using {:?}",
        s.len(),
        g.len(),
        solver
    );

    let solved = match solver {
        Solver::Inverse => solve_inverse(s, g)?,
        Solver::Banded => solve_banded(s, g),
    };

    Ok(match solved {
        Ok(calcium) => Convolved {
            calcium,
            outcome: Outcome::Solved,
        },
        Err(e) => {
            log::warn!(
                "{:?} solve failed ({}), returning spike train unchanged",
                solver,
                e
            );
            Convolved {
                calcium: s.to_vec(),
                outcome: Outcome::Passthrough(e),
            }
        }
    })
}

/// [`convolve_g`] with coefficients taken from an [`ArModel`].
pub fn convolve(s: &[f64], model: &ArModel, solver: Solver) -> Result<Convolved, DeconvError> {
    convolve_g(s, model.coefficients(), solver)
}

/// Applies `G` to a calcium trace, recovering the spike train: `s = G·c`.
///
/// Computes `s[t] = c[t] - Σ gᵢ·c[t-i]` without forming the matrix.
///
/// # Errors
///
/// Same shape checks as [`convolve_g`].
pub fn spikes_from_calcium(c: &[f64], g: &[f64]) -> Result<Vec<f64>, DeconvError> {
    check_order(g.len(), c.len())?;

    Ok((0..c.len())
        .map(|t| {
            let past: f64 = g
                .iter()
                .enumerate()
                .take(t)
                .map(|(i, &gi)| gi * c[t - 1 - i])
                .sum();
            c[t] - past
        })
        .collect())
}

/// Outer result: shape errors. Inner result: numerical failure.
fn solve_inverse(s: &[f64], g: &[f64]) -> Result<Result<Vec<f64>, LinalgError>, DeconvError> {
    let matrix = construct_g(g, s.len())?;
    Ok(matrix.inverse().and_then(|inv| inv.mul_vec(s)))
}

fn solve_banded(s: &[f64], g: &[f64]) -> Result<Vec<f64>, LinalgError> {
    let mut c = vec![0.0; s.len()];
    for t in 0..s.len() {
        let mut acc = s[t];
        for (i, &gi) in g.iter().enumerate().take(t) {
            acc += gi * c[t - 1 - i];
        }
        c[t] = acc;
    }

    if c.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::NumericalInstability);
    }
    Ok(c)
}
