//! Simulated impulse responses of fitted AR models.
//!
//! Drives the model with a unit impulse at t = 0 and returns stimulus and
//! response side by side, which is how a fitted unit's kinetics are checked
//! visually. [`pulse_train`] generalizes this to impulses at a fixed period.

use alloc::vec;
use alloc::vec::Vec;

use crate::convolve::{convolve_g, Outcome, Solver};
use crate::error::DeconvError;

/// Default number of samples in a simulated pulse response.
pub const DEFAULT_PULSE_LENGTH: usize = 500;

/// Stimulus/response pair from a pulse simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseResponse {
    /// Synthetic spike train
    pub spikes: Vec<f64>,
    /// Simulated calcium response
    pub calcium: Vec<f64>,
    /// Outcome of the underlying solve
    pub outcome: Outcome,
}

impl PulseResponse {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    /// True if the simulation has no samples.
    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    /// True if the simulation fell back to the stimulus.
    pub fn is_passthrough(&self) -> bool {
        matches!(self.outcome, Outcome::Passthrough(_))
    }

    /// Index and value of the response maximum (first occurrence).
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.calcium
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .fold(None, |best, (i, v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
    }

    /// First index after the peak where the response has decayed to
    /// `fraction` of the peak value or below.
    ///
    /// Returns `None` if the response never decays that far within the
    /// simulated window, or if the peak is not positive.
    ///
    /// # Example
    ///
    /// ```
    /// use calcitrace::pulse_response;
    ///
    /// let response = pulse_response(&[0.5], 10).unwrap();
    /// // 1, 0.5, 0.25, ...
    /// assert_eq!(response.decay_index(0.5), Some(1));
    /// ```
    pub fn decay_index(&self, fraction: f64) -> Option<usize> {
        let (peak_idx, peak) = self.peak()?;
        if peak <= 0.0 {
            return None;
        }
        let threshold = peak * fraction;
        self.calcium[peak_idx + 1..]
            .iter()
            .position(|&v| v <= threshold)
            .map(|offset| peak_idx + 1 + offset)
    }
}

/// Simulates the response of AR coefficients `g` to a single unit impulse.
///
/// # Arguments
///
/// * `g` - AR coefficients
/// * `length` - Number of samples (see [`DEFAULT_PULSE_LENGTH`])
///
/// # Errors
///
/// Shape errors from [`convolve_g`]: `length` must exceed `g.len()`.
///
/// # Example
///
/// ```
/// use calcitrace::{pulse_response, DEFAULT_PULSE_LENGTH};
///
/// let response = pulse_response(&[0.95], DEFAULT_PULSE_LENGTH).unwrap();
/// assert_eq!(response.spikes.len(), 500);
/// assert_eq!(response.calcium.len(), 500);
/// assert_eq!(response.spikes[0], 1.0);
/// ```
pub fn pulse_response(g: &[f64], length: usize) -> Result<PulseResponse, DeconvError> {
    pulse_response_with(g, length, Solver::Banded)
}

/// [`pulse_response`] with an explicit solver.
pub fn pulse_response_with(
    g: &[f64],
    length: usize,
    solver: Solver,
) -> Result<PulseResponse, DeconvError> {
    // A period equal to the length places exactly one impulse, at t = 0
    simulate(g, impulse_train(length, length.max(1))?, solver)
}

/// Simulates the response to unit impulses every `period` samples starting at 0.
///
/// # Errors
///
/// - `DeconvError::InvalidPeriod` if `period == 0`
/// - Shape errors from [`convolve_g`]
pub fn pulse_train(g: &[f64], length: usize, period: usize) -> Result<PulseResponse, DeconvError> {
    simulate(g, impulse_train(length, period)?, Solver::Banded)
}

fn impulse_train(length: usize, period: usize) -> Result<Vec<f64>, DeconvError> {
    if period == 0 {
        return Err(DeconvError::InvalidPeriod);
    }
    let mut spikes = vec![0.0; length];
    for t in (0..length).step_by(period) {
        spikes[t] = 1.0;
    }
    Ok(spikes)
}

fn simulate(g: &[f64], spikes: Vec<f64>, solver: Solver) -> Result<PulseResponse, DeconvError> {
    let convolved = convolve_g(&spikes, g, solver)?;
    Ok(PulseResponse {
        spikes,
        calcium: convolved.calcium,
        outcome: convolved.outcome,
    })
}
