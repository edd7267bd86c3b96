//! Python bindings for trace normalization.

use calcitrace::{DegeneratePolicy, Normalizer};
use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Rescale a trace onto [0, 1], ignoring NaN.
///
/// Args:
///     a (np.ndarray): 1D float64 array.
///     degenerate (str): Output for constant traces: "zero" (default),
///         "midpoint" or "nan".
///
/// Returns:
///     np.ndarray: Normalized copy; NaN stays NaN.
///
/// Example:
///     >>> import pycalcitrace as ct
///     >>> import numpy as np
///     >>> ct.normalize(np.array([2.0, 4.0, 6.0]))
///     array([0. , 0.5, 1. ])
#[pyfunction]
#[pyo3(signature = (a, degenerate = "zero"))]
fn normalize<'py>(
    py: Python<'py>,
    a: PyReadonlyArray1<f64>,
    degenerate: &str,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let policy = match degenerate {
        "zero" => DegeneratePolicy::Zero,
        "midpoint" => DegeneratePolicy::Midpoint,
        "nan" => DegeneratePolicy::Nan,
        _ => {
            return Err(PyValueError::new_err(format!(
                "Unknown degenerate policy '{}'. Use 'zero', 'midpoint' or 'nan'",
                degenerate
            )))
        }
    };
    let a = a
        .as_slice()
        .map_err(|_| PyValueError::new_err("a must be a contiguous float64 array"))?;

    Ok(PyArray1::from_vec(py, Normalizer::new(policy).normalize(a)))
}

/// Register normalization functions with the module.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(normalize, m)?)?;
    Ok(())
}
