//! Spike inference from fluorescence with the OASIS algorithm.
//!
//! This module provides [`oasis_ar1`], the Online Active Set method to Infer
//! Spikes (Friedrich et al., 2017) for an AR(1) calcium model, run over a
//! whole trace. It is the inverse problem of [`convolve_g`](crate::convolve_g):
//! given a noisy fluorescence trace, find the sparse non-negative spike train
//! and the denoised calcium trace consistent with it.
//!
//! # Algorithm Overview
//!
//! OASIS solves:
//!
//! minimize ½||y - c||² + λ||s||₁
//!
//! subject to: c[t] = γ·c[t-1] + s[t], s[t] ≥ 0
//!
//! where:
//! - y[t] = fluorescence observation (baseline-subtracted)
//! - c[t] = calcium concentration
//! - s[t] = spike train
//! - γ ∈ (0,1) = decay factor
//! - λ = sparsity penalty
//!
//! Samples are grouped into pools. Inside a pool calcium decays freely, so
//! a pool is described by its initial value. Each new sample starts a pool;
//! whenever a pool starts below the decayed end of its predecessor (which
//! would need a negative spike) the two are merged into their weighted
//! least-squares fit and the check repeats backward.
//!
//! # Example
//!
//! ```
//! use calcitrace::{oasis_ar1, pulse_response};
//!
//! // Noise-free response to one spike at t = 0
//! let trace = pulse_response(&[0.9], 50).unwrap().calcium;
//! let result = oasis_ar1(&trace, 0.9, 0.0).unwrap();
//!
//! assert!((result.spikes[0] - 1.0).abs() < 1e-9);
//! assert!(result.spikes[1..].iter().all(|&s| s.abs() < 1e-9));
//! ```
//!
//! # References
//!
//! Friedrich, J., Zhou, P., & Paninski, L. (2017). Fast online deconvolution
//! of calcium imaging data. PLOS Computational Biology, 13(3), e1005423.
//! <https://doi.org/10.1371/journal.pcbi.1005423>

use alloc::vec;
use alloc::vec::Vec;

use crate::convolve::spikes_from_calcium;
use crate::error::DeconvError;

/// Pool representing a contiguous segment that follows one free decay.
#[derive(Clone, Copy, Debug)]
struct Pool {
    /// Calcium concentration at the first sample of the segment
    value: f64,
    /// Accumulated weight Σ γ^(2i) over the segment
    weight: f64,
    /// First sample index
    start: usize,
    /// Number of samples in this pool
    len: usize,
}

/// Result of OASIS deconvolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Deconvolved {
    /// Denoised calcium trace c\[t\]
    pub calcium: Vec<f64>,
    /// Inferred spike train s\[t\], non-negative
    pub spikes: Vec<f64>,
    /// Number of pools in the final active set
    pub pools: usize,
}

/// Runs OASIS on `y` for an AR(1) model.
///
/// # Arguments
///
/// * `y` - Baseline-subtracted fluorescence trace
/// * `gamma` - Decay factor γ ∈ (0, 1), see [`ArModel::from_tau`](crate::ArModel::from_tau)
/// * `lambda` - Sparsity penalty λ ≥ 0. Higher values give sparser spikes.
///
/// # Errors
///
/// - `DeconvError::EmptyTrace` if `y` is empty
/// - `DeconvError::InvalidParameter` if `gamma` or `lambda` is out of range
///
/// # Performance
///
/// Amortized O(T): each sample is merged at most once.
pub fn oasis_ar1(y: &[f64], gamma: f64, lambda: f64) -> Result<Deconvolved, DeconvError> {
    if y.is_empty() {
        return Err(DeconvError::EmptyTrace);
    }
    if !(gamma > 0.0 && gamma < 1.0) {
        return Err(DeconvError::InvalidParameter {
            name: "gamma",
            value: gamma,
        });
    }
    if !(lambda >= 0.0 && lambda.is_finite()) {
        return Err(DeconvError::InvalidParameter {
            name: "lambda",
            value: lambda,
        });
    }

    let last = y.len() - 1;
    let mut pools: Vec<Pool> = Vec::with_capacity(y.len());
    let mut merges = 0usize;

    for (t, &obs) in y.iter().enumerate() {
        // The L1 penalty shifts every observation; the last sample has no successor to absorb it
        let shift = if t == last { lambda } else { lambda * (1.0 - gamma) };
        pools.push(Pool {
            value: obs - shift,
            weight: 1.0,
            start: t,
            len: 1,
        });

        while pools.len() > 1 {
            let n = pools.len();
            let prev = pools[n - 2];
            let curr = pools[n - 1];

            let decay = libm::pow(gamma, prev.len as f64);
            if prev.value * decay <= curr.value {
                break;
            }

            pools[n - 2] = merge(prev, curr, decay);
            pools.pop();
            merges += 1;
        }
    }

    log::trace!(
        "oasis: {} samples, {} pools after {} merges",
        y.len(),
        pools.len(),
        merges
    );

    let mut calcium = vec![0.0; y.len()];
    for pool in &pools {
        let mut c = pool.value.max(0.0);
        for slot in &mut calcium[pool.start..pool.start + pool.len] {
            *slot = c;
            c *= gamma;
        }
    }

    let spikes = if calcium.len() > 1 {
        spikes_from_calcium(&calcium, &[gamma])?
    } else {
        calcium.clone()
    };
    // Clamp rounding noise (enforces s >= 0 constraint)
    let spikes = spikes.into_iter().map(|s| s.max(0.0)).collect();

    Ok(Deconvolved {
        calcium,
        spikes,
        pools: pools.len(),
    })
}

/// Merges two adjacent pools into their weighted least-squares fit.
///
/// value = (w₁·v₁ + γ^l₁·w₂·v₂) / (w₁ + γ^(2l₁)·w₂)
fn merge(prev: Pool, curr: Pool, decay: f64) -> Pool {
    let weight = prev.weight + decay * decay * curr.weight;
    let value = (prev.weight * prev.value + decay * curr.weight * curr.value) / weight;
    Pool {
        value,
        weight,
        start: prev.start,
        len: prev.len + curr.len,
    }
}
