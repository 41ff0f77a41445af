//! In-memory model artifacts and the store that owns them.
use std::collections::BTreeMap;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::{
    estimators::{Estimator, EstimatorError, EstimatorResult, StandardScaler},
    populations::ModelTarget,
    profiling::FeatureKey,
};

/// Version string stamped on every artifact and store this build writes.
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to evaluate one target: the ordered input layout, the
/// scaler fitted on it, the estimator, the producing version and the
/// cross-validation metric recorded at training time.
///
/// `accuracy` is the mean fold accuracy for classifiers and the mean
/// normalised absolute error for regressors (lower is better).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub features: Vec<FeatureKey>,
    pub scaler: StandardScaler,
    pub estimator: Estimator,
    pub accuracy: f64,
}

impl ModelArtifact {
    /// Artifact stamped with [`CRATE_VERSION`].
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] when the scaler, the estimator
    /// and the feature list disagree on the input width.
    pub fn new(
        features: Vec<FeatureKey>, scaler: StandardScaler, estimator: Estimator, accuracy: f64,
    ) -> EstimatorResult<Self> {
        for found in [scaler.n_features(), estimator.n_features()] {
            if found != features.len() {
                return Err(EstimatorError::DimensionMismatch { expected: features.len(), found });
            }
        }
        Ok(Self { version: CRATE_VERSION.to_string(), features, scaler, estimator, accuracy })
    }

    /// Check an artifact that did not come through [`ModelArtifact::new`].
    ///
    /// The feature list, the scaler moments and the estimator weights must
    /// share one width, and the fitted values must be finite.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] or the scaler's and estimator's
    /// own validation errors.
    pub fn validate(&self) -> EstimatorResult<()> {
        self.scaler.validate()?;
        for found in [self.scaler.n_features(), self.estimator.n_features()] {
            if found != self.features.len() {
                return Err(EstimatorError::DimensionMismatch { expected: self.features.len(), found });
            }
        }
        self.estimator.validate()
    }

    /// Scale a raw feature row and evaluate the estimator on it.
    ///
    /// # Errors
    /// [`EstimatorError::DimensionMismatch`] for a wrong row width.
    pub fn predict(&self, raw: ArrayView1<'_, f64>) -> EstimatorResult<f64> {
        let scaled = self.scaler.transform_row(raw)?;
        self.estimator.predict(scaled.view())
    }
}

/// Immutable-after-load collection of artifacts keyed by target.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStore {
    version: String,
    artifacts: BTreeMap<ModelTarget, ModelArtifact>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore {
    /// Empty store stamped with [`CRATE_VERSION`].
    pub fn new() -> Self {
        Self::with_version(CRATE_VERSION)
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self { version: version.into(), artifacts: BTreeMap::new() }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Insert or replace the artifact of `target`, returning the old one.
    pub fn insert(&mut self, target: ModelTarget, artifact: ModelArtifact) -> Option<ModelArtifact> {
        self.artifacts.insert(target, artifact)
    }

    pub fn get(&self, target: ModelTarget) -> Option<&ModelArtifact> {
        self.artifacts.get(&target)
    }

    pub fn contains(&self, target: ModelTarget) -> bool {
        self.artifacts.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelTarget, &ModelArtifact)> + '_ {
        self.artifacts.iter().map(|(&t, a)| (t, a))
    }

    /// Recorded metric per target, in canonical target order.
    pub fn accuracy(&self) -> BTreeMap<ModelTarget, f64> {
        self.iter().map(|(t, a)| (t, a.accuracy)).collect()
    }
}
