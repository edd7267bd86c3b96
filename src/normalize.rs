//! Min-max normalization of traces with missing values.
//!
//! Traces are rescaled so that their finite minimum maps to 0 and their
//! finite maximum maps to 1. NaN marks a missing sample: it is skipped when
//! computing the range and stays NaN in the output.
//!
//! A constant trace has no range to divide by. What it maps to is chosen by
//! [`DegeneratePolicy`].
//!
//! # Example
//!
//! ```
//! use calcitrace::normalize;
//!
//! let out = normalize(&[2.0, f64::NAN, 4.0, 6.0]);
//! assert_eq!(out[0], 0.0);
//! assert!(out[1].is_nan());
//! assert_eq!(out[2], 0.5);
//! assert_eq!(out[3], 1.0);
//! ```

use alloc::vec::Vec;

/// Output for a trace whose finite values are all equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DegeneratePolicy {
    /// Every non-missing sample maps to 0.0
    #[default]
    Zero,
    /// Every non-missing sample maps to 0.5
    Midpoint,
    /// Every sample maps to NaN
    Nan,
}

/// Finite minimum and maximum of a trace, ignoring NaN and infinities.
pub fn finite_range(a: &[f64]) -> Option<(f64, f64)> {
    a.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Min-max normalizer with an explicit degenerate-range policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Normalizer {
    /// What a constant trace maps to
    pub degenerate: DegeneratePolicy,
}

impl Normalizer {
    /// Creates a normalizer with the given policy.
    pub fn new(degenerate: DegeneratePolicy) -> Self {
        Self { degenerate }
    }

    /// Rescales `a` onto [0, 1].
    ///
    /// Values are clamped to the unit interval, so infinities map to the
    /// nearest end. Empty or all-missing input is returned unchanged.
    pub fn normalize(&self, a: &[f64]) -> Vec<f64> {
        let Some((lo, hi)) = finite_range(a) else {
            return a.to_vec();
        };

        if hi == lo {
            let fill = match self.degenerate {
                DegeneratePolicy::Zero => 0.0,
                DegeneratePolicy::Midpoint => 0.5,
                DegeneratePolicy::Nan => f64::NAN,
            };
            return a
                .iter()
                .map(|v| if v.is_nan() { f64::NAN } else { fill })
                .collect();
        }

        // Ranges wider than f64::MAX are halved before subtracting
        let scale = if (hi - lo).is_finite() { 1.0 } else { 0.5 };
        let (lo, span) = (lo * scale, hi * scale - lo * scale);
        a.iter()
            .map(|&v| {
                if v.is_nan() {
                    v
                } else {
                    ((v * scale - lo) / span).clamp(0.0, 1.0)
                }
            })
            .collect()
    }
}

/// Rescales `a` onto [0, 1] with [`DegeneratePolicy::Zero`].
pub fn normalize(a: &[f64]) -> Vec<f64> {
    Normalizer::default().normalize(a)
}

/// Linearly maps the finite range of `a` onto `[lo, hi]`.
///
/// Constant traces map to `lo`. NaN stays NaN.
pub fn scale_to_range(a: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    normalize(a)
        .into_iter()
        .map(|v| lo + v * (hi - lo))
        .collect()
}

/// Quantizes `a` to 8-bit intensities, for frame export.
///
/// The finite range maps onto `0..=255` with rounding; NaN maps to 0.
pub fn to_u8(a: &[f64]) -> Vec<u8> {
    normalize(a)
        .into_iter()
        .map(|v| {
            if v.is_nan() {
                0
            } else {
                // Normalized values are clamped to [0, 1]
                libm::round(v * 255.0) as u8
            }
        })
        .collect()
}
