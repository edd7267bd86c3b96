//! Python bindings for calcitrace.
//!
//! Every function takes and returns 1D float64 NumPy arrays, except
//! `construct_g` which returns a 2D array.

use calcitrace::DeconvError;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

mod convolution;
mod deconvolution;
mod normalize;

/// Maps input-validation errors onto `ValueError`.
pub(crate) fn value_error(e: DeconvError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

#[pymodule]
fn pycalcitrace(m: &Bound<'_, PyModule>) -> PyResult<()> {
    convolution::register(m)?;
    normalize::register(m)?;
    deconvolution::register(m)?;
    m.add("DEFAULT_PULSE_LENGTH", calcitrace::DEFAULT_PULSE_LENGTH)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
