//! YAML persistence of a [`ModelStore`].
//!
//! Document layout:
//!
//! ```yaml
//! version: 0.1.0
//! artifacts:
//!   spherical_normal: { version, features, scaler, estimator, accuracy }
//!   r0_sphere: ...
//! ```
//!
//! `save` also writes `<stem>_accuracy.txt` next to the document with one
//! `target: metric` line per artifact. `load` restores every entry it can:
//! entries that fail to deserialize or validate, or whose key names no
//! target, are returned as [`CorruptArtifact`]s instead of failing the whole
//! load.
use std::{
    collections::BTreeMap,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    populations::ModelTarget,
    store::{
        artifact::{CRATE_VERSION, ModelArtifact, ModelStore},
        errors::{CorruptArtifact, StoreError, StoreResult, StoreWarning},
    },
};

#[derive(Serialize)]
struct StoreDocumentRef<'a> {
    version: &'a str,
    artifacts: BTreeMap<&'static str, &'a ModelArtifact>,
}

#[derive(Deserialize)]
struct StoreDocument {
    version: String,
    #[serde(default)]
    artifacts: BTreeMap<String, serde_yml::Value>,
}

/// Result of [`load`]: the usable store plus everything that went wrong
/// without being fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedStore {
    pub store: ModelStore,
    /// Version recorded in the document header.
    pub version: String,
    pub warnings: Vec<StoreWarning>,
    pub corrupt: Vec<CorruptArtifact>,
}

/// Write `store` to `destination` as YAML, plus the sibling accuracy file.
///
/// # Errors
/// - [`StoreError::Serialize`] if YAML rendering fails.
/// - [`StoreError::Io`] if either file cannot be written.
pub fn save(store: &ModelStore, destination: impl AsRef<Path>) -> StoreResult<()> {
    let destination = destination.as_ref();
    let doc = StoreDocumentRef {
        version: store.version(),
        artifacts: store.iter().map(|(t, a)| (t.name(), a)).collect(),
    };
    let yaml = serde_yml::to_string(&doc)
        .map_err(|e| StoreError::Serialize { reason: e.to_string() })?;
    write_file(destination, &yaml)?;

    let mut report = String::new();
    for (target, accuracy) in store.accuracy() {
        let _ = writeln!(report, "{target}: {accuracy}");
    }
    write_file(&accuracy_path(destination), &report)
}

/// Read a store written by [`save`].
///
/// Version differences between the document, its artifacts and this build
/// are logged with `log::warn!` and returned as [`StoreWarning`]s.
///
/// # Errors
/// - [`StoreError::Io`] if `source` cannot be read.
/// - [`StoreError::Malformed`] if the top-level document does not parse.
pub fn load(source: impl AsRef<Path>) -> StoreResult<LoadedStore> {
    let source = source.as_ref();
    let text = fs::read_to_string(source)
        .map_err(|e| StoreError::Io { path: source.display().to_string(), reason: e.to_string() })?;
    let doc: StoreDocument =
        serde_yml::from_str(&text).map_err(|e| StoreError::Malformed { reason: e.to_string() })?;

    let mut warnings = Vec::new();
    if doc.version != CRATE_VERSION {
        warnings.push(StoreWarning::VersionMismatch {
            target: None,
            found: doc.version.clone(),
            expected: CRATE_VERSION.to_string(),
        });
    }

    let mut store = ModelStore::with_version(doc.version.clone());
    let mut corrupt = Vec::new();
    for (key, value) in doc.artifacts {
        let target = match key.parse::<ModelTarget>() {
            Ok(t) => t,
            Err(e) => {
                corrupt.push(CorruptArtifact { target: key, reason: e.to_string() });
                continue;
            }
        };
        let artifact = match parse_artifact(value) {
            Ok(artifact) => artifact,
            Err(reason) => {
                corrupt.push(CorruptArtifact { target: key, reason });
                continue;
            }
        };
        if artifact.version != CRATE_VERSION {
            warnings.push(StoreWarning::VersionMismatch {
                target: Some(target),
                found: artifact.version.clone(),
                expected: CRATE_VERSION.to_string(),
            });
        }
        store.insert(target, artifact);
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    for c in &corrupt {
        log::warn!("{c}");
    }
    Ok(LoadedStore { store, version: doc.version, warnings, corrupt })
}

/// Deserialize one entry and run [`ModelArtifact::validate`] on it.
fn parse_artifact(value: serde_yml::Value) -> Result<ModelArtifact, String> {
    let artifact = serde_yml::from_value::<ModelArtifact>(value).map_err(|e| e.to_string())?;
    artifact.validate().map_err(|e| e.to_string())?;
    Ok(artifact)
}

/// `<dir>/<stem>_accuracy.txt` for a store document at `<dir>/<stem>.<ext>`.
pub fn accuracy_path(destination: &Path) -> PathBuf {
    let stem = destination.file_stem().and_then(|s| s.to_str()).unwrap_or("models");
    destination.with_file_name(format!("{stem}_accuracy.txt"))
}

fn write_file(path: &Path, contents: &str) -> StoreResult<()> {
    fs::write(path, contents)
        .map_err(|e| StoreError::Io { path: path.display().to_string(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimators::{Estimator, RegressionLoss, SgdClassifier, SgdParams, SgdRegressor, StandardScaler},
        populations::{ParameterKind, PopulationKind},
        profiling::FeatureKey,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - save -> load round trip and the sibling accuracy file.
    // - Per-entry corruption, inconsistent widths and unknown target names.
    // - Version mismatch warnings.
    // - Fatal I/O and malformed-document errors.
    // -------------------------------------------------------------------------

    const FEATURES: [FeatureKey; 2] = [FeatureKey::PearsonQ, FeatureKey::QAtImax];

    fn toy_store() -> ModelStore {
        let x = array![[0.0, 1.0], [1.0, 0.5], [2.0, 0.0], [3.0, -0.5]];
        let labels = array![0.0, 0.0, 1.0, 1.0];
        let values = array![1.0, 2.0, 3.0, 4.0];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        let xs = scaler.transform(x.view()).unwrap();

        let clf = SgdClassifier::fit(xs.view(), labels.view(), SgdParams::default()).unwrap();
        let reg = SgdRegressor::fit(
            xs.view(),
            values.view(),
            RegressionLoss::Huber { epsilon: 0.1 },
            SgdParams::default(),
        )
        .unwrap();

        let mut store = ModelStore::new();
        store.insert(
            ModelTarget::Classifier(PopulationKind::SphericalNormal),
            ModelArtifact::new(FEATURES.to_vec(), scaler.clone(), Estimator::from(clf), 0.75).unwrap(),
        );
        store.insert(
            ModelTarget::Regressor(ParameterKind::R0Sphere),
            ModelArtifact::new(FEATURES.to_vec(), scaler, Estimator::from(reg), 0.2).unwrap(),
        );
        store
    }

    #[test]
    // Purpose
    // -------
    // A saved store loads back equal, with no warnings, and its artifacts
    // predict exactly as before.
    //
    // Given
    // -----
    // - A store with one classifier and one Huber regressor.
    //
    // Expect
    // ------
    // - Loaded store == saved store; identical predictions.
    // - `<stem>_accuracy.txt` lists both targets.
    fn save_then_load_round_trips() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yml");
        let store = toy_store();

        // Act
        save(&store, &path).unwrap();
        let loaded = load(&path).unwrap();

        // Assert
        assert!(loaded.warnings.is_empty());
        assert!(loaded.corrupt.is_empty());
        assert_eq!(loaded.version, CRATE_VERSION);
        assert_eq!(loaded.store, store);
        let row = array![1.5, 0.2];
        for (target, artifact) in store.iter() {
            let restored = loaded.store.get(target).unwrap();
            assert_eq!(restored.predict(row.view()).unwrap(), artifact.predict(row.view()).unwrap());
        }
        let report = fs::read_to_string(dir.path().join("models_accuracy.txt")).unwrap();
        assert!(report.contains("spherical_normal: 0.75"));
        assert!(report.contains("r0_sphere: 0.2"));
    }

    #[test]
    // Purpose
    // -------
    // A broken entry and an unknown key are reported as corrupt while the
    // remaining target still loads.
    fn corrupt_entries_do_not_block_siblings() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yml");
        save(&toy_store(), &path).unwrap();
        let mut doc: serde_yml::Value =
            serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let artifacts = doc.get_mut("artifacts").unwrap().as_mapping_mut().unwrap();
        artifacts.insert("r0_sphere".into(), "not an artifact".into());
        artifacts.insert("cylinders".into(), serde_yml::Value::Null);
        fs::write(&path, serde_yml::to_string(&doc).unwrap()).unwrap();

        // Act
        let loaded = load(&path).unwrap();

        // Assert
        assert_eq!(loaded.store.len(), 1);
        assert!(loaded.store.contains(ModelTarget::Classifier(PopulationKind::SphericalNormal)));
        let names: Vec<&str> = loaded.corrupt.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(names, vec!["cylinders", "r0_sphere"]);
    }

    #[test]
    // Purpose
    // -------
    // An entry that deserializes but whose scaler variance is one feature
    // short is corrupt, not silently loaded.
    //
    // Given
    // -----
    // - A saved two-feature store; the last `var` entry of `r0_sphere` is
    //   removed from the YAML.
    //
    // Expect
    // ------
    // - `r0_sphere` is reported corrupt with a width mismatch.
    // - The classifier still loads and predicts as before.
    fn short_scaler_variance_is_corrupt() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yml");
        let store = toy_store();
        save(&store, &path).unwrap();
        let mut doc: serde_yml::Value =
            serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let var = doc
            .get_mut("artifacts")
            .and_then(|a| a.get_mut("r0_sphere"))
            .and_then(|a| a.get_mut("scaler"))
            .and_then(|s| s.get_mut("var"))
            .unwrap()
            .as_sequence_mut()
            .unwrap();
        var.pop();
        assert_eq!(var.len(), 1);
        fs::write(&path, serde_yml::to_string(&doc).unwrap()).unwrap();

        // Act
        let loaded = load(&path).unwrap();

        // Assert
        let regressor = ModelTarget::Regressor(ParameterKind::R0Sphere);
        let classifier = ModelTarget::Classifier(PopulationKind::SphericalNormal);
        assert!(!loaded.store.contains(regressor));
        assert_eq!(loaded.corrupt.len(), 1);
        assert_eq!(loaded.corrupt[0].target, "r0_sphere");
        assert!(loaded.corrupt[0].reason.contains("Expected 2 features, found 1"));
        let row = array![1.5, 0.2];
        assert_eq!(
            loaded.store.get(classifier).unwrap().predict(row.view()).unwrap(),
            store.get(classifier).unwrap().predict(row.view()).unwrap()
        );
    }

    #[test]
    fn version_mismatch_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.yml");
        let mut store = ModelStore::with_version("0.0.1");
        let target = ModelTarget::Classifier(PopulationKind::SphericalNormal);
        let mut artifact = toy_store().get(target).unwrap().clone();
        artifact.version = "0.0.1".to_string();
        store.insert(target, artifact);
        save(&store, &path).unwrap();

        let loaded = load(&path).unwrap();

        assert_eq!(loaded.version, "0.0.1");
        assert_eq!(loaded.store.len(), 1);
        assert_eq!(
            loaded.warnings,
            vec![
                StoreWarning::VersionMismatch {
                    target: None,
                    found: "0.0.1".to_string(),
                    expected: CRATE_VERSION.to_string(),
                },
                StoreWarning::VersionMismatch {
                    target: Some(target),
                    found: "0.0.1".to_string(),
                    expected: CRATE_VERSION.to_string(),
                },
            ]
        );
    }

    #[test]
    fn unreadable_and_malformed_documents_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path().join("missing.yml")), Err(StoreError::Io { .. })));

        let path = dir.path().join("bad.yml");
        fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(matches!(load(&path), Err(StoreError::Malformed { .. })));
    }
}
