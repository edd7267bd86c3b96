//! Python bindings for OASIS calcium deconvolution.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::value_error;

/// Infer spikes from a fluorescence trace with OASIS (AR(1) model).
///
/// Args:
///     y (np.ndarray): 1D float64 baseline-subtracted fluorescence.
///     gamma (float): Decay factor, 0 < gamma < 1.
///     lambda_ (float): Sparsity penalty, >= 0.
///
/// Returns:
///     tuple: (calcium, spikes) as 1D float64 arrays.
///
/// Example:
///     >>> import pycalcitrace as ct
///     >>> _, trace = ct.pulse_response(np.array([0.9]), 50)
///     >>> calcium, spikes = ct.oasis_ar1(trace, 0.9, 0.0)
#[pyfunction]
#[pyo3(signature = (y, gamma, lambda_ = 0.0))]
fn oasis_ar1<'py>(
    py: Python<'py>,
    y: PyReadonlyArray1<f64>,
    gamma: f64,
    lambda_: f64,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
    let y = y
        .as_slice()
        .map_err(|_| PyValueError::new_err("y must be a contiguous float64 array"))?;

    let result = calcitrace::oasis_ar1(y, gamma, lambda_).map_err(value_error)?;
    Ok((
        PyArray1::from_vec(py, result.calcium),
        PyArray1::from_vec(py, result.spikes),
    ))
}

/// Register deconvolution functions with the module.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(oasis_ar1, m)?)?;
    Ok(())
}
