//! Autoregressive calcium-indicator models.
//!
//! An AR(k) model describes calcium fluorescence as
//! `c[t] = g₁·c[t-1] + ... + g_k·c[t-k] + s[t]`.
//!
//! # Parameter Selection
//!
//! For AR(1) the decay factor relates to the indicator time constant τ by
//! γ = exp(-Δt / τ):
//! - GCaMP6f (τ ≈ 100ms at 30Hz): γ ≈ 0.72
//! - GCaMP6s (τ ≈ 550ms at 30Hz): γ ≈ 0.94
//!
//! AR(2) additionally captures the finite rise time. With decay and rise
//! factors d = exp(-Δt/τ_d) and r = exp(-Δt/τ_r) the coefficients are
//! g₁ = d + r and g₂ = -d·r.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::DeconvError;

/// Validated AR coefficient vector for one unit.
///
/// Coefficient values are not range-checked, so degenerate models can still
/// be handed to the solvers and exercise their fallback.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct ArModel {
    coefficients: Vec<f64>,
}

impl ArModel {
    /// Creates a model from lag coefficients `[g₁, ..., g_k]`.
    ///
    /// # Errors
    ///
    /// Returns `DeconvError::EmptyModel` if no coefficients are given.
    pub fn new(coefficients: Vec<f64>) -> Result<Self, DeconvError> {
        if coefficients.is_empty() {
            return Err(DeconvError::EmptyModel);
        }
        Ok(Self { coefficients })
    }

    /// AR(1) model from physical parameters.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Imaging frame rate in Hz
    /// * `tau` - Indicator decay time constant in seconds
    ///
    /// # Example
    ///
    /// ```
    /// use calcitrace::ArModel;
    ///
    /// // GCaMP6f with 100ms decay, 30Hz sampling
    /// let model = ArModel::from_tau(30.0, 0.1).unwrap();
    /// assert!((model.coefficients()[0] - (-1.0f64 / 3.0).exp()).abs() < 1e-12);
    /// ```
    pub fn from_tau(sample_rate: f64, tau: f64) -> Result<Self, DeconvError> {
        let gamma = decay_factor(sample_rate, tau)?;
        Ok(Self {
            coefficients: vec![gamma],
        })
    }

    /// AR(2) model from rise and decay time constants (seconds).
    ///
    /// # Errors
    ///
    /// Returns `DeconvError::InvalidTimeConstant` for non-positive inputs.
    pub fn from_rise_decay(
        sample_rate: f64,
        tau_rise: f64,
        tau_decay: f64,
    ) -> Result<Self, DeconvError> {
        let d = decay_factor(sample_rate, tau_decay)?;
        let r = decay_factor(sample_rate, tau_rise)?;
        Ok(Self {
            coefficients: vec![d + r, -d * r],
        })
    }

    /// Model order k.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Lag coefficients `[g₁, ..., g_k]`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Sufficient stability check for positive-decay models: Σgᵢ < 1 with
    /// every coefficient finite.
    pub fn is_stable(&self) -> bool {
        self.coefficients.iter().all(|g| g.is_finite())
            && self.coefficients.iter().sum::<f64>() < 1.0
    }
}

impl TryFrom<Vec<f64>> for ArModel {
    type Error = DeconvError;

    fn try_from(coefficients: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(coefficients)
    }
}

impl From<ArModel> for Vec<f64> {
    fn from(model: ArModel) -> Self {
        model.coefficients
    }
}

fn decay_factor(sample_rate: f64, tau: f64) -> Result<f64, DeconvError> {
    let valid = |x: f64| x.is_finite() && x > 0.0;
    if !valid(sample_rate) || !valid(tau) {
        return Err(DeconvError::InvalidTimeConstant);
    }
    let dt = 1.0 / sample_rate;
    Ok(libm::exp(-dt / tau))
}
