//! Shape-parameter regression for the populations a spectrum contains.
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    populations::{ModelTarget, ParameterEstimate, PopulationFlags, PopulationKind},
    prediction::{errors::PredictResult, evaluate::evaluate_target},
    profiling::{FeatureVector, detailed_profile},
    spectrum::Spectrum,
    store::ModelStore,
};

/// Parameter regressors backed by a shared [`ModelStore`].
///
/// One scatterer instance per population is assumed: each flagged
/// population receives a single value for each of its regressed parameters.
#[derive(Debug, Clone)]
pub struct SaxsRegressor {
    store: Arc<ModelStore>,
}

impl SaxsRegressor {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Estimate the regressed shape parameters of every flagged population.
    ///
    /// Targets that need a detailed profile get it computed from `spectrum`,
    /// once per population. Predictions are clamped to the parameter limits.
    /// Unidentified spectra and flags without regressed populations give an
    /// empty estimate.
    ///
    /// # Errors
    /// - [`PredictError::ModelNotLoaded`](crate::prediction::PredictError::ModelNotLoaded)
    ///   for a missing regressor of a flagged population.
    /// - [`PredictError::Profile`](crate::prediction::PredictError::Profile)
    ///   if a detailed profile fails.
    pub fn predict_params(
        &self, flags: &PopulationFlags, features: &FeatureVector, spectrum: &Spectrum,
    ) -> PredictResult<ParameterEstimate> {
        let mut out = ParameterEstimate::new();
        if flags.is_unidentified() {
            return Ok(out);
        }
        let mut extended: BTreeMap<PopulationKind, FeatureVector> = BTreeMap::new();
        for pop in flags.identified() {
            for &param in pop.regressed_parameters() {
                let target = ModelTarget::Regressor(param);
                let inputs = match target.detailed_profile() {
                    Some(detail) => {
                        if !extended.contains_key(&detail) {
                            let mut fv = features.clone();
                            fv.extend(&detailed_profile(spectrum, detail)?);
                            extended.insert(detail, fv);
                        }
                        &extended[&detail]
                    }
                    None => features,
                };
                let value = evaluate_target(&self.store, target, inputs)?;
                out.insert(param, param.clamp(value));
            }
        }
        Ok(out)
    }
}
