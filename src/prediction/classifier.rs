//! Population classification from profiled features.
use std::sync::Arc;

use crate::{
    populations::{ModelTarget, PopulationConfidence, PopulationFlags, PopulationKind},
    prediction::{errors::PredictResult, evaluate::evaluate_target},
    profiling::FeatureVector,
    store::ModelStore,
};

/// Probability at or above which a population is flagged present.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary population classifiers backed by a shared [`ModelStore`].
#[derive(Debug, Clone)]
pub struct SaxsClassifier {
    store: Arc<ModelStore>,
}

impl SaxsClassifier {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Flag the populations present in a profiled spectrum.
    ///
    /// `unidentified` is evaluated first. When it fires, every other flag is
    /// false and its confidence `None`; otherwise each scatterer classifier is
    /// evaluated independently.
    ///
    /// # Errors
    /// [`PredictError::ModelNotLoaded`](crate::prediction::PredictError::ModelNotLoaded)
    /// for a missing classifier that the decision path reaches, or a feature
    /// error from the artifact.
    pub fn classify(
        &self, features: &FeatureVector,
    ) -> PredictResult<(PopulationFlags, PopulationConfidence)> {
        let mut flags = PopulationFlags::new();
        let mut confidence = PopulationConfidence::new();

        let p_unidentified = self.probability(PopulationKind::Unidentified, features)?;
        confidence.set(PopulationKind::Unidentified, Some(p_unidentified));
        if p_unidentified >= DECISION_THRESHOLD {
            flags.set(PopulationKind::Unidentified, true);
            return Ok((flags, confidence));
        }

        for kind in PopulationKind::SCATTERERS {
            let p = self.probability(kind, features)?;
            confidence.set(kind, Some(p));
            flags.set(kind, p >= DECISION_THRESHOLD);
        }
        Ok((flags, confidence))
    }

    fn probability(&self, kind: PopulationKind, features: &FeatureVector) -> PredictResult<f64> {
        evaluate_target(&self.store, ModelTarget::Classifier(kind), features)
    }
}
