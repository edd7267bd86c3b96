//! Per-unit temporal review.
//!
//! After temporal fitting every unit has a raw trace, a fitted calcium trace,
//! a fitted spike train, the fitted signal, and AR coefficients. Reviewing
//! them means showing all four traces on a common scale next to the model's
//! simulated pulse response. This module does the numerical part of that for
//! a whole collection of units; rendering is left to the caller.
//!
//! # Example
//!
//! ```
//! use calcitrace::{review_units, ReviewConfig, UnitTraces};
//!
//! let unit = UnitTraces {
//!     unit_id: 7,
//!     raw: vec![0.0, 3.0, 2.0, 1.0],
//!     calcium: vec![0.0, 2.8, 2.2, 1.1],
//!     spikes: vec![0.0, 2.8, 0.0, 0.0],
//!     fitted: vec![0.1, 2.9, 2.1, 1.2],
//!     g: vec![0.8],
//! };
//!
//! let reviews = review_units(&[unit], &ReviewConfig::default()).unwrap();
//! assert_eq!(reviews[0].raw, vec![0.0, 1.0, 2.0 / 3.0, 1.0 / 3.0]);
//! assert_eq!(reviews[0].pulse.len(), 500);
//! ```

use alloc::vec::Vec;

use crate::convolve::Solver;
use crate::error::DeconvError;
use crate::normalize::{DegeneratePolicy, Normalizer};
use crate::pulse::{pulse_response_with, PulseResponse, DEFAULT_PULSE_LENGTH};

/// Fitted traces of one unit. All four traces share one frame axis.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTraces {
    /// Unit identifier
    pub unit_id: u32,
    /// Raw fluorescence projected onto the unit's footprint
    pub raw: Vec<f64>,
    /// Fitted calcium trace
    pub calcium: Vec<f64>,
    /// Fitted spike train
    pub spikes: Vec<f64>,
    /// Fitted signal (calcium plus baseline and noise terms)
    pub fitted: Vec<f64>,
    /// AR coefficients of the unit
    pub g: Vec<f64>,
}

/// Review settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReviewConfig {
    /// Rescale every trace onto [0, 1]
    pub normalize: bool,
    /// Samples in the simulated pulse response
    pub pulse_length: usize,
    /// Solver used for the pulse response
    pub solver: Solver,
    /// Mapping for constant traces when normalizing
    pub degenerate: DegeneratePolicy,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            pulse_length: DEFAULT_PULSE_LENGTH,
            solver: Solver::Banded,
            degenerate: DegeneratePolicy::Zero,
        }
    }
}

/// Review-ready traces of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReview {
    /// Unit identifier
    pub unit_id: u32,
    /// Raw trace, normalized if requested
    pub raw: Vec<f64>,
    /// Calcium trace, normalized if requested
    pub calcium: Vec<f64>,
    /// Spike train, normalized if requested
    pub spikes: Vec<f64>,
    /// Fitted signal, normalized if requested
    pub fitted: Vec<f64>,
    /// Simulated response of the unit's AR model to a unit impulse
    pub pulse: PulseResponse,
}

impl UnitReview {
    /// True if the pulse simulation fell back to the stimulus.
    pub fn passthrough(&self) -> bool {
        self.pulse.is_passthrough()
    }
}

/// Prepares every unit for review.
///
/// # Errors
///
/// - `DeconvError::LengthMismatch` if a unit's traces differ in length
/// - Shape errors from the pulse simulation (`pulse_length` must exceed the
///   unit's model order)
pub fn review_units(
    units: &[UnitTraces],
    config: &ReviewConfig,
) -> Result<Vec<UnitReview>, DeconvError> {
    let normalizer = Normalizer::new(config.degenerate);
    let reviews = units
        .iter()
        .map(|unit| review_unit(unit, config, &normalizer))
        .collect::<Result<Vec<_>, _>>()?;

    let fallbacks = reviews.iter().filter(|r| r.passthrough()).count();
    if fallbacks > 0 {
        log::warn!(
            "{} of {} units have a passthrough pulse response",
            fallbacks,
            reviews.len()
        );
    }
    log::debug!("reviewed {} units", reviews.len());

    Ok(reviews)
}

fn review_unit(
    unit: &UnitTraces,
    config: &ReviewConfig,
    normalizer: &Normalizer,
) -> Result<UnitReview, DeconvError> {
    let expected = unit.raw.len();
    for trace in [&unit.calcium, &unit.spikes, &unit.fitted] {
        if trace.len() != expected {
            return Err(DeconvError::LengthMismatch {
                unit_id: unit.unit_id,
                expected,
                got: trace.len(),
            });
        }
    }

    let prepare = |trace: &[f64]| {
        if config.normalize {
            normalizer.normalize(trace)
        } else {
            trace.to_vec()
        }
    };

    Ok(UnitReview {
        unit_id: unit.unit_id,
        raw: prepare(&unit.raw),
        calcium: prepare(&unit.calcium),
        spikes: prepare(&unit.spikes),
        fitted: prepare(&unit.fitted),
        pulse: pulse_response_with(&unit.g, config.pulse_length, config.solver)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn unit(unit_id: u32, g: Vec<f64>) -> UnitTraces {
        UnitTraces {
            unit_id,
            raw: vec![1.0, 5.0, 3.0, 2.0, 1.0],
            calcium: vec![0.0, 4.0, 3.2, 2.56, 2.048],
            spikes: vec![0.0, 4.0, 0.0, 0.0, 0.0],
            fitted: vec![0.5, 4.5, 3.5, 2.5, 2.0],
            g,
        }
    }

    #[test]
    fn test_normalized_traces() {
        let reviews = review_units(&[unit(1, vec![0.8])], &ReviewConfig::default()).unwrap();
        let r = &reviews[0];

        assert_eq!(r.unit_id, 1);
        assert_eq!(r.raw, vec![0.0, 1.0, 0.5, 0.25, 0.0]);
        assert_eq!(r.spikes, vec![0.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(r.calcium.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(!r.passthrough());
    }

    #[test]
    fn test_without_normalization() {
        let config = ReviewConfig {
            normalize: false,
            ..ReviewConfig::default()
        };
        let input = unit(2, vec![0.8]);
        let reviews = review_units(&[input.clone()], &config).unwrap();

        assert_eq!(reviews[0].raw, input.raw);
        assert_eq!(reviews[0].fitted, input.fitted);
    }

    #[test]
    fn test_pulse_length_from_config() {
        let config = ReviewConfig {
            pulse_length: 32,
            ..ReviewConfig::default()
        };
        let reviews = review_units(&[unit(3, vec![1.2, -0.35])], &config).unwrap();

        assert_eq!(reviews[0].pulse.len(), 32);
        assert_eq!(reviews[0].pulse.spikes[0], 1.0);
    }

    #[test]
    fn test_solvers_give_same_pulse() {
        let banded = ReviewConfig {
            pulse_length: 40,
            ..ReviewConfig::default()
        };
        let inverse = ReviewConfig {
            solver: Solver::Inverse,
            ..banded
        };
        let units = [unit(4, vec![1.5, -0.56])];

        let a = review_units(&units, &banded).unwrap();
        let b = review_units(&units, &inverse).unwrap();

        for (x, y) in a[0].pulse.calcium.iter().zip(&b[0].pulse.calcium) {
            assert!(libm::fabs(x - y) < 1e-9);
        }
    }

    #[test]
    fn test_passthrough_reported_per_unit() {
        let units = [unit(5, vec![0.9]), unit(6, vec![f64::INFINITY])];
        let reviews = review_units(&units, &ReviewConfig::default()).unwrap();

        assert!(!reviews[0].passthrough());
        assert!(reviews[1].passthrough());
        assert_eq!(reviews[1].pulse.calcium, reviews[1].pulse.spikes);
    }

    #[test]
    fn test_length_mismatch() {
        let mut bad = unit(9, vec![0.9]);
        bad.fitted.pop();

        assert_eq!(
            review_units(&[bad], &ReviewConfig::default()),
            Err(DeconvError::LengthMismatch {
                unit_id: 9,
                expected: 5,
                got: 4
            })
        );
    }

    #[test]
    fn test_degenerate_trace_policy() {
        let mut flat = unit(10, vec![0.9]);
        flat.spikes = vec![0.0; 5];
        let config = ReviewConfig {
            degenerate: DegeneratePolicy::Midpoint,
            ..ReviewConfig::default()
        };

        let reviews = review_units(&[flat], &config).unwrap();
        assert_eq!(reviews[0].spikes, vec![0.5; 5]);
    }

    #[test]
    fn test_empty_collection() {
        assert!(review_units(&[], &ReviewConfig::default())
            .unwrap()
            .is_empty());
    }
}
