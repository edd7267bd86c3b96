//! Python bindings for the convolution matrix, AR convolution and pulse simulation.

use calcitrace::Solver;
use numpy::ndarray::Array2;
use numpy::{PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::value_error;

fn parse_solver(name: &str) -> PyResult<Solver> {
    match name {
        "banded" => Ok(Solver::Banded),
        "inverse" => Ok(Solver::Inverse),
        _ => Err(PyValueError::new_err(format!(
            "Unknown solver '{}'. Use 'banded' or 'inverse'",
            name
        ))),
    }
}

/// Build the T x T convolution matrix G of an AR model.
///
/// Args:
///     g (np.ndarray): 1D float64 array of AR coefficients.
///     t (int): Trace length, must exceed len(g).
///
/// Returns:
///     np.ndarray: 2D float64 array with G @ c == s.
///
/// Example:
///     >>> import pycalcitrace as ct
///     >>> import numpy as np
///     >>> G = ct.construct_g(np.array([0.9]), 4)
///     >>> G[1, 0]
///     -0.9
#[pyfunction]
fn construct_g<'py>(
    py: Python<'py>,
    g: PyReadonlyArray1<f64>,
    t: usize,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let g = g
        .as_slice()
        .map_err(|_| PyValueError::new_err("g must be a contiguous float64 array"))?;
    let matrix = calcitrace::construct_g(g, t).map_err(value_error)?;

    let array = Array2::from_shape_vec((t, t), matrix.data().to_vec())
        .map_err(|e| PyValueError::new_err(format!("Failed to reshape output: {}", e)))?;
    Ok(PyArray2::from_owned_array(py, array))
}

/// Convolve a spike train with an AR kernel.
///
/// Args:
///     s (np.ndarray): 1D float64 spike train.
///     g (np.ndarray): 1D float64 AR coefficients, len(g) < len(s).
///     solver (str): "banded" (default) or "inverse".
///
/// Returns:
///     tuple: (calcium, passthrough). When the solve fails numerically,
///         calcium is a copy of s and passthrough is True.
#[pyfunction]
#[pyo3(signature = (s, g, solver = "banded"))]
fn convolve_g<'py>(
    py: Python<'py>,
    s: PyReadonlyArray1<f64>,
    g: PyReadonlyArray1<f64>,
    solver: &str,
) -> PyResult<(Bound<'py, PyArray1<f64>>, bool)> {
    let solver = parse_solver(solver)?;
    let s = s
        .as_slice()
        .map_err(|_| PyValueError::new_err("s must be a contiguous float64 array"))?;
    let g = g
        .as_slice()
        .map_err(|_| PyValueError::new_err("g must be a contiguous float64 array"))?;

    let result = calcitrace::convolve_g(s, g, solver).map_err(value_error)?;
    let passthrough = result.is_passthrough();
    Ok((PyArray1::from_vec(py, result.calcium), passthrough))
}

/// Simulate the response of an AR model to a unit impulse at t = 0.
///
/// Args:
///     g (np.ndarray): 1D float64 AR coefficients.
///     length (int): Number of samples (default 500).
///
/// Returns:
///     tuple: (spikes, calcium) as 1D float64 arrays.
#[pyfunction]
#[pyo3(signature = (g, length = calcitrace::DEFAULT_PULSE_LENGTH))]
fn pulse_response<'py>(
    py: Python<'py>,
    g: PyReadonlyArray1<f64>,
    length: usize,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
    let g = g
        .as_slice()
        .map_err(|_| PyValueError::new_err("g must be a contiguous float64 array"))?;

    let response = calcitrace::pulse_response(g, length).map_err(value_error)?;
    Ok((
        PyArray1::from_vec(py, response.spikes),
        PyArray1::from_vec(py, response.calcium),
    ))
}

/// Register convolution functions with the module.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(construct_g, m)?)?;
    m.add_function(wrap_pyfunction!(convolve_g, m)?)?;
    m.add_function(wrap_pyfunction!(pulse_response, m)?)?;
    Ok(())
}
