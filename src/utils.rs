//! Conversion helpers shared by the Python bindings.
//!
//! The name/value conversions are plain Rust and unit tested here; the
//! array extraction helpers only exist with the `python-bindings` feature.
use std::collections::BTreeMap;

use crate::{
    populations::{ParameterEstimate, PopulationFlags, PopulationKind, UnknownKeyError},
    profiling::FeatureVector,
};

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::spectrum::Spectrum;

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

/// Flags with every named population set.
///
/// Naming `unidentified` together with a scatterer keeps whichever was named
/// last, following [`PopulationFlags::set`].
///
/// # Errors
/// Returns [`UnknownKeyError`] for a name that is not a population.
pub fn extract_flags(names: &[String]) -> Result<PopulationFlags, UnknownKeyError> {
    let mut flags = PopulationFlags::new();
    for name in names {
        let kind: PopulationKind = name.parse()?;
        flags.set(kind, true);
    }
    Ok(flags)
}

pub fn features_to_map(features: &FeatureVector) -> BTreeMap<String, f64> {
    features.iter().map(|(k, v)| (k.name().to_string(), v)).collect()
}

pub fn params_to_map(params: &ParameterEstimate) -> BTreeMap<String, f64> {
    params.iter().map(|(k, v)| (k.name().to_string(), v)).collect()
}

/// Borrow a 1-D `float64` view of a numpy array, pandas Series or sequence.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Build a validated [`Spectrum`] from two Python array-likes.
#[cfg(feature = "python-bindings")]
pub fn extract_spectrum<'py>(
    py: Python<'py>, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
) -> PyResult<Spectrum> {
    let q_arr = extract_f64_array(py, q)?;
    let i_arr = extract_f64_array(py, intensity)?;
    let q_slice = q_arr
        .as_slice()
        .map_err(|_| PyValueError::new_err("q must be a 1-D contiguous float64 array"))?;
    let i_slice = i_arr
        .as_slice()
        .map_err(|_| PyValueError::new_err("intensity must be a 1-D contiguous float64 array"))?;
    let spectrum = Spectrum::new(Array1::from(q_slice.to_vec()), Array1::from(i_slice.to_vec()))?;
    Ok(spectrum)
}
