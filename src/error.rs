//! Error types for input validation.
//!
//! Numerical failures of a solve are not errors here: they are reported through
//! [`Outcome::Passthrough`](crate::convolve::Outcome::Passthrough). `DeconvError`
//! covers malformed input only, and formats without allocating.

use core::fmt;

/// Errors returned for malformed input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeconvError {
    /// A trace of length zero was supplied
    EmptyTrace,

    /// An AR model with no coefficients was supplied
    EmptyModel,

    /// Model order must be strictly less than the trace length
    OrderTooLarge {
        /// Number of AR coefficients
        order: usize,
        /// Trace length T
        length: usize,
    },

    /// Traces belonging to one unit have different frame counts
    LengthMismatch {
        /// Unit the traces belong to
        unit_id: u32,
        /// Frame count of the raw trace
        expected: usize,
        /// Frame count of the offending trace
        got: usize,
    },

    /// Toeplitz column and row do not have the same non-zero length
    ShapeMismatch {
        /// Column length
        column: usize,
        /// Row length
        row: usize,
    },

    /// Impulse period of zero
    InvalidPeriod,

    /// Sample rate or time constant is not strictly positive and finite
    InvalidTimeConstant,

    /// A scalar parameter is out of its valid range
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Footprint pixel count does not match its height x width grid
    FootprintShape {
        /// Grid rows
        height: usize,
        /// Grid columns
        width: usize,
        /// Number of weights supplied
        got: usize,
    },
}

impl fmt::Display for DeconvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTrace => write!(f, "trace is empty"),
            Self::EmptyModel => write!(f, "AR model has no coefficients"),
            Self::OrderTooLarge { order, length } => write!(
                f,
                "AR order {order} must be smaller than trace length {length}"
            ),
            Self::LengthMismatch {
                unit_id,
                expected,
                got,
            } => write!(
                f,
                "unit {unit_id}: expected {expected} frames, got {got}"
            ),
            Self::ShapeMismatch { column, row } => write!(
                f,
                "Toeplitz column has length {column} but row has length {row}"
            ),
            Self::InvalidPeriod => write!(f, "impulse period must be positive"),
            Self::InvalidTimeConstant => {
                write!(f, "sample rate and time constants must be positive")
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid value {value} for parameter `{name}`")
            }
            Self::FootprintShape { height, width, got } => write!(
                f,
                "footprint has {got} pixels, expected {height}x{width}"
            ),
        }
    }
}

impl core::error::Error for DeconvError {}
