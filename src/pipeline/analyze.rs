//! Spectrum → flags → parameters → refined intensity fit.
use std::sync::Arc;

use crate::{
    fitting::{FitError, FitOptions, FitReport, SaxsFitter},
    pipeline::errors::PipelineResult,
    populations::{ParameterEstimate, PopulationConfidence, PopulationFlags, PopulationKind},
    prediction::{SaxsClassifier, SaxsRegressor},
    profiling::{FeatureVector, profile},
    spectrum::Spectrum,
    store::ModelStore,
};

/// Everything the pipeline learned about one spectrum.
///
/// `params` holds the refined parameters when a fit ran, and is empty for
/// unidentified spectra or spectra with no flagged population. `fit` is
/// `None` exactly when no fit ran.
#[derive(Debug, Clone, PartialEq)]
pub struct SaxsAnalysis {
    pub features: FeatureVector,
    pub flags: PopulationFlags,
    pub confidence: PopulationConfidence,
    pub params: ParameterEstimate,
    pub fit: Option<FitReport>,
}

/// Convenience chaining of profiling, classification, regression and
/// intensity fitting over one shared model store.
#[derive(Debug, Clone)]
pub struct SaxsPipeline {
    classifier: SaxsClassifier,
    regressor: SaxsRegressor,
    fit_opts: FitOptions,
}

impl SaxsPipeline {
    pub fn new(store: Arc<ModelStore>, fit_opts: FitOptions) -> Self {
        Self {
            classifier: SaxsClassifier::new(Arc::clone(&store)),
            regressor: SaxsRegressor::new(store),
            fit_opts,
        }
    }

    pub fn classifier(&self) -> &SaxsClassifier {
        &self.classifier
    }

    pub fn regressor(&self) -> &SaxsRegressor {
        &self.regressor
    }

    /// Analyze one spectrum.
    ///
    /// Regressed shape parameters are held fixed while the intensity-scale
    /// parameters are fitted from seeds derived from the spectrum. Peak parameters come from the windowed peak
    /// finder. A fit that stops at the iteration cap is not an error here:
    /// its best-effort parameters are returned with `converged == false` in
    /// the report.
    ///
    /// # Errors
    /// - [`PipelineError::Profile`](crate::pipeline::PipelineError::Profile)
    ///   for spectra the profiler rejects.
    /// - [`PipelineError::Predict`](crate::pipeline::PipelineError::Predict)
    ///   for missing models.
    /// - [`PipelineError::Fit`](crate::pipeline::PipelineError::Fit) for
    ///   fit errors other than divergence.
    pub fn analyze(&self, spectrum: &Spectrum) -> PipelineResult<SaxsAnalysis> {
        let features = profile(spectrum)?;
        let (flags, confidence) = self.classifier.classify(&features)?;
        let mut analysis =
            SaxsAnalysis { features, flags, confidence, params: ParameterEstimate::new(), fit: None };
        if flags.is_unidentified() || flags.identified().is_empty() {
            return Ok(analysis);
        }

        let regressed = self.regressor.predict_params(&flags, &analysis.features, spectrum)?;
        let fitter = SaxsFitter::new(spectrum, flags, self.fit_opts.clone())?;
        let initial = if flags.get(PopulationKind::DiffractionPeaks) {
            fitter.estimate_peak_params(Some(&regressed))
        } else {
            regressed
        };

        match fitter.fit_intensity_params(&initial) {
            Ok(outcome) => {
                analysis.params = outcome.params;
                analysis.fit = Some(outcome.report);
            }
            Err(FitError::FitDivergence { best, report }) => {
                log::warn!(
                    "intensity fit stopped without converging ({}); keeping best parameters",
                    report.status
                );
                analysis.params = best;
                analysis.fit = Some(*report);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        physics::spherical_normal, populations::ParameterKind, prediction::fixtures,
    };
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The unidentified path (no regression, no fit).
    // - The identified path: regressed shapes held fixed, intensities fitted.
    // - Propagation of missing models.
    // -------------------------------------------------------------------------

    fn sphere_spectrum() -> Spectrum {
        let q = Array1::linspace(0.01, 0.3, 200);
        let i = spherical_normal(q.view(), 1000.0, 40.0, 0.05) + 0.5;
        Spectrum::new(q, i).unwrap()
    }

    #[test]
    fn unidentified_spectrum_is_not_fitted() {
        let store = fixtures::store_with(&[(PopulationKind::Unidentified, true)], &[]);
        let pipeline = SaxsPipeline::new(Arc::new(store), FitOptions::default());

        let analysis = pipeline.analyze(&sphere_spectrum()).unwrap();

        assert!(analysis.flags.is_unidentified());
        assert!(analysis.params.is_empty());
        assert_eq!(analysis.fit, None);
        assert_eq!(analysis.features.len(), 20);
    }

    #[test]
    // Purpose
    // -------
    // With the sphere population flagged and exact shape estimates, the
    // pipeline recovers the sphere intensity and the floor.
    //
    // Given
    // -----
    // - Classifiers flagging only spherical_normal for any real spectrum.
    // - Constant regressors returning r0 = 40 and sigma = 0.05.
    //
    // Expect
    // ------
    // - Converged fit, shapes unchanged, I0_sphere within 5% of 1000.
    fn identified_spectrum_is_fitted_with_regressed_shapes() {
        // Arrange
        let store = fixtures::store_with(
            &[
                (PopulationKind::Unidentified, false),
                (PopulationKind::SphericalNormal, true),
                (PopulationKind::GuinierPorod, false),
                (PopulationKind::DiffractionPeaks, false),
            ],
            &[(ParameterKind::R0Sphere, 40.0, 0.0), (ParameterKind::SigmaSphere, 0.05, 0.0)],
        );
        let pipeline = SaxsPipeline::new(Arc::new(store), FitOptions::default());

        // Act
        let analysis = pipeline.analyze(&sphere_spectrum()).unwrap();

        // Assert
        assert_eq!(analysis.flags.identified(), vec![PopulationKind::SphericalNormal]);
        let report = analysis.fit.unwrap();
        assert!(report.converged, "status: {}", report.status);
        assert_eq!(report.n_free_params, 2);
        let r0 = analysis.params.get(ParameterKind::R0Sphere).unwrap();
        let sigma = analysis.params.get(ParameterKind::SigmaSphere).unwrap();
        assert!((r0 - 40.0).abs() < 1e-6, "r0 = {r0}");
        assert!((sigma - 0.05).abs() < 1e-6, "sigma = {sigma}");
        let i0 = analysis.params.get(ParameterKind::I0Sphere).unwrap();
        assert!((i0 - 1000.0).abs() / 1000.0 < 0.05, "I0_sphere = {i0}");
    }

    #[test]
    fn missing_models_surface_as_predict_errors() {
        let pipeline = SaxsPipeline::new(Arc::new(ModelStore::new()), FitOptions::default());
        let err = pipeline.analyze(&sphere_spectrum()).unwrap_err();
        assert!(matches!(err, crate::pipeline::PipelineError::Predict(_)));
    }
}
