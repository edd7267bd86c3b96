//! Autoregressive calcium-trace convolution and review utilities.
//!
//! Calcium imaging records fluorescence that rises with each spike and
//! decays with the kinetics of the indicator. An AR(k) model describes this
//! with coefficients `g`: `c[t] = s[t] + Σ gᵢ·c[t-i]`. This crate provides
//! the pieces needed to work with such models after temporal fitting:
//!
//! - [`construct_g`]: the lower-triangular Toeplitz matrix `G` with `G·c = s`
//! - [`convolve_g`]: spike train to calcium trace, with passthrough fallback
//! - [`pulse_response`]: simulated response of a model to a unit impulse
//! - [`normalize`]: NaN-aware min-max rescaling onto [0, 1]
//! - [`oasis_ar1`]: sparse non-negative spike inference (the inverse problem)
//! - [`review_units`]: all of the above applied to a collection of units
//! - [`centroids`]: centers of mass of spatial footprints
//!
//! The library is `no_std` and allocates through `alloc`.

#![no_std]

extern crate alloc;

mod centroid;
mod convolve;
mod error;
pub mod linalg;
mod model;
mod normalize;
mod oasis;
mod pulse;
mod review;
mod toeplitz;

pub use centroid::{center_of_mass, centroid, centroids, Centroid, Extent, UnitFootprint};
pub use convolve::{convolve, convolve_g, spikes_from_calcium, Convolved, Outcome, Solver};
pub use error::DeconvError;
pub use linalg::{LinalgError, Matrix};
pub use model::ArModel;
pub use normalize::{finite_range, normalize, scale_to_range, to_u8, DegeneratePolicy, Normalizer};
pub use oasis::{oasis_ar1, Deconvolved};
pub use pulse::{
    pulse_response, pulse_response_with, pulse_train, PulseResponse, DEFAULT_PULSE_LENGTH,
};
pub use review::{review_units, ReviewConfig, UnitReview, UnitTraces};
pub use toeplitz::{construct_g, toeplitz};
