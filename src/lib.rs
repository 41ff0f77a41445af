//! rust_saxs — classification, parameter regression and model fitting for
//! small-angle X-ray scattering spectra, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the SAXS workflow to Python via the `_rust_saxs` extension module. When the
//! `python-bindings` feature is enabled, this module defines the Python-facing
//! classes and submodules used by the `rust_saxs` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules as the public crate surface:
//!   `spectrum` → `profiling` → `prediction` → `fitting`, with `training`
//!   and `store` producing and persisting the models `prediction` consumes,
//!   and `pipeline` chaining the whole analysis.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_saxs` Python extension.
//! - Register the Python submodules `profiling` and `models` under
//!   `rust_saxs` so that dot-notation imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion and error mapping.
//! - Python dictionaries are keyed by the canonical snake_case names of
//!   features, populations and parameters (`FeatureKey::name`,
//!   `PopulationKind::name`, `ParameterKind::name`).
//!
//! Conventions
//! -----------
//! - Errors from core Rust code are propagated as rich error types internally
//!   and converted to `PyErr` values at the PyO3 boundary.
//! - Diagnostics go through the `log` facade; the host application chooses
//!   the logger.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on the inner modules directly, typically
//!   [`pipeline::SaxsPipeline`] for inference and [`training::Trainer`] for
//!   model building.
//! - The Python packaging layer imports `_rust_saxs` and wraps its classes in
//!   user-facing Python APIs.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   end-to-end tests under `tests/`.

pub mod estimators;
pub mod fitting;
pub mod optimization;
pub mod physics;
pub mod pipeline;
pub mod populations;
pub mod prediction;
pub mod profiling;
pub mod spectrum;
pub mod store;
pub mod training;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::{collections::BTreeMap, sync::Arc};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    fitting::FitOptions,
    pipeline::{SaxsAnalysis, SaxsPipeline},
    populations::{PopulationFlags, PopulationKind},
    prediction::{SaxsClassifier, SaxsRegressor},
    profiling::{FeatureVector, detailed_profile, profile},
    store::ModelStore,
    training::{CsvRecordSource, RecordSource, TargetSelection, TrainOptions, Trainer},
    utils::{extract_flags, extract_spectrum, features_to_map, params_to_map},
};

/// Profile a spectrum into its base descriptors.
///
/// Returns a `dict[str, float]` keyed by feature name.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "profile")]
#[pyo3(text_signature = "(q, intensity, /)")]
fn py_profile<'py>(
    py: Python<'py>, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
) -> PyResult<BTreeMap<String, f64>> {
    let spectrum = extract_spectrum(py, q, intensity)?;
    Ok(features_to_map(&profile(&spectrum)?))
}

/// Population-specific descriptors of a spectrum.
///
/// `population` must be `"spherical_normal"` or `"guinier_porod"`; other
/// populations have no detailed descriptors and return an empty dict.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "detailed_profile")]
#[pyo3(text_signature = "(q, intensity, population, /)")]
fn py_detailed_profile<'py>(
    py: Python<'py>, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>, population: &str,
) -> PyResult<BTreeMap<String, f64>> {
    let kind: PopulationKind = population.parse()?;
    let spectrum = extract_spectrum(py, q, intensity)?;
    Ok(features_to_map(&detailed_profile(&spectrum, kind)?))
}

/// SaxsModels — Python-facing handle on a trained model store.
///
/// Purpose
/// -------
/// Load, train, save and apply the per-target models. One instance shares a
/// single immutable [`ModelStore`] between its classifier, regressor and
/// pipeline.
///
/// Notes
/// -----
/// - Corrupt artifacts found by `load` are skipped and reported through
///   `corrupt_targets`; version mismatches are logged and listed in
///   `warnings`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_saxs.models")]
pub struct SaxsModels {
    store: Arc<ModelStore>,
    warnings: Vec<String>,
    corrupt: Vec<String>,
}

#[cfg(feature = "python-bindings")]
impl SaxsModels {
    fn from_store(store: ModelStore) -> Self {
        Self { store: Arc::new(store), warnings: Vec::new(), corrupt: Vec::new() }
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SaxsModels {
    /// Load a store written by `save`.
    #[staticmethod]
    #[pyo3(text_signature = "(path, /)")]
    pub fn load(path: &str) -> PyResult<Self> {
        let loaded = store::load(path)?;
        Ok(Self {
            store: Arc::new(loaded.store),
            warnings: loaded.warnings.iter().map(|w| w.to_string()).collect(),
            corrupt: loaded.corrupt.iter().map(|c| c.target.clone()).collect(),
        })
    }

    /// Train every target from `<data_dir>/<id>.csv` tables.
    #[staticmethod]
    #[pyo3(
        signature = (data_dir, experiment_ids, search_hyperparameters = false, seed = 0),
        text_signature = "(data_dir, experiment_ids, /, search_hyperparameters=False, seed=0)"
    )]
    pub fn train(
        data_dir: &str, experiment_ids: Vec<String>, search_hyperparameters: bool, seed: u64,
    ) -> PyResult<Self> {
        let records = CsvRecordSource::new(data_dir).fetch_records(&experiment_ids)?;
        let trainer = Trainer::new(TrainOptions::default().with_seed(seed));
        let run = trainer.train(&records, search_hyperparameters, TargetSelection::All);
        Ok(Self::from_store(run.into_store()))
    }

    /// Warm-start every stored model on new tables; returns a new handle.
    #[pyo3(
        signature = (data_dir, experiment_ids, eval_ids = None),
        text_signature = "(self, data_dir, experiment_ids, /, eval_ids=None)"
    )]
    pub fn update(
        &self, data_dir: &str, experiment_ids: Vec<String>, eval_ids: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let source = CsvRecordSource::new(data_dir);
        let new_records = source.fetch_records(&experiment_ids)?;
        let eval_records = match eval_ids {
            Some(ids) => source.fetch_records(&ids)?,
            None => new_records.clone(),
        };
        let run = Trainer::default().update(&new_records, &self.store, &eval_records);
        Ok(Self::from_store(run.into_store()))
    }

    #[pyo3(text_signature = "(self, path, /)")]
    pub fn save(&self, path: &str) -> PyResult<()> {
        store::save(&self.store, path)?;
        Ok(())
    }

    /// Names of the targets with a loaded model.
    #[getter]
    pub fn targets(&self) -> Vec<String> {
        self.store.iter().map(|(t, _)| t.name().to_string()).collect()
    }

    #[getter]
    pub fn accuracy(&self) -> BTreeMap<String, f64> {
        self.store.accuracy().into_iter().map(|(t, v)| (t.name().to_string(), v)).collect()
    }

    #[getter]
    pub fn version(&self) -> String {
        self.store.version().to_string()
    }

    #[getter]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.clone()
    }

    #[getter]
    pub fn corrupt_targets(&self) -> Vec<String> {
        self.corrupt.clone()
    }

    /// Population flags of a spectrum as `dict[str, bool]`.
    #[pyo3(text_signature = "(self, q, intensity, /)")]
    pub fn classify<'py>(
        &self, py: Python<'py>, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
    ) -> PyResult<BTreeMap<String, bool>> {
        let spectrum = extract_spectrum(py, q, intensity)?;
        let features = profile(&spectrum)?;
        let (flags, _) = SaxsClassifier::new(Arc::clone(&self.store)).classify(&features)?;
        Ok(flags.iter().map(|(k, v)| (k.name().to_string(), v)).collect())
    }

    /// Regressed shape parameters for the given population names.
    #[pyo3(text_signature = "(self, q, intensity, populations, /)")]
    pub fn predict_params<'py>(
        &self, py: Python<'py>, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
        populations: Vec<String>,
    ) -> PyResult<BTreeMap<String, f64>> {
        let spectrum = extract_spectrum(py, q, intensity)?;
        let flags: PopulationFlags = extract_flags(&populations)?;
        let features: FeatureVector = profile(&spectrum)?;
        let params = SaxsRegressor::new(Arc::clone(&self.store))
            .predict_params(&flags, &features, &spectrum)?;
        Ok(params_to_map(&params))
    }

    /// Full analysis: profile, classify, regress and fit intensities.
    #[pyo3(
        signature = (q, intensity, max_iter = None),
        text_signature = "(self, q, intensity, /, max_iter=None)"
    )]
    pub fn analyze<'py>(
        &self, py: Python<'py>, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
        max_iter: Option<usize>,
    ) -> PyResult<Analysis> {
        let spectrum = extract_spectrum(py, q, intensity)?;
        let opts = match max_iter {
            Some(n) => FitOptions::with_max_iter(n)?,
            None => FitOptions::default(),
        };
        let inner = SaxsPipeline::new(Arc::clone(&self.store), opts).analyze(&spectrum)?;
        Ok(Analysis { inner })
    }
}

/// Analysis — result of `SaxsModels.analyze` exposed to Python.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_saxs.models")]
pub struct Analysis {
    inner: SaxsAnalysis,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Analysis {
    #[getter]
    pub fn features(&self) -> BTreeMap<String, f64> {
        features_to_map(&self.inner.features)
    }

    /// Names of the flagged populations, `["unidentified"]` included.
    #[getter]
    pub fn populations(&self) -> Vec<String> {
        self.inner.flags.iter().filter(|(_, v)| *v).map(|(k, _)| k.name().to_string()).collect()
    }

    /// Positive-class probabilities of the classifiers that ran.
    #[getter]
    pub fn confidence(&self) -> BTreeMap<String, f64> {
        self.inner
            .confidence
            .iter()
            .filter_map(|(k, v)| v.map(|p| (k.name().to_string(), p)))
            .collect()
    }

    #[getter]
    pub fn params(&self) -> BTreeMap<String, f64> {
        params_to_map(&self.inner.params)
    }

    /// `None` when no fit ran.
    #[getter]
    pub fn converged(&self) -> Option<bool> {
        self.inner.fit.as_ref().map(|r| r.converged)
    }

    #[getter]
    pub fn fit_snr(&self) -> Option<f64> {
        self.inner.fit.as_ref().map(|r| r.fit_snr)
    }

    #[getter]
    pub fn final_objective(&self) -> Option<f64> {
        self.inner.fit.as_ref().map(|r| r.final_objective)
    }
}

/// Python module initializer for `_rust_saxs`.
///
/// Creates the `profiling` and `models` submodules and registers them in
/// `sys.modules` under `rust_saxs.*` so that dot-notation imports work.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating submodules or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_saxs<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let profiling_mod = PyModule::new(_py, "profiling")?;
    let models_mod = PyModule::new(_py, "models")?;
    profiling_module(_py, m, &profiling_mod)?;
    models_module(_py, m, &models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_saxs.profiling", profiling_mod)?;
    _py.import("sys")?.getattr("modules")?.set_item("rust_saxs.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn profiling_module<'py>(
    _py: Python, rust_saxs: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_profile, m)?)?;
    m.add_function(wrap_pyfunction!(py_detailed_profile, m)?)?;
    rust_saxs.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn models_module<'py>(
    _py: Python, rust_saxs: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<SaxsModels>()?;
    m.add_class::<Analysis>()?;
    rust_saxs.add_submodule(m)?;
    Ok(())
}
