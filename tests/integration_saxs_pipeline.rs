//! Integration tests for the SAXS workflow.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: synthetic spectra are profiled into
//!   labelled training records, models are trained per target, persisted,
//!   reloaded, warm-started and finally used by the analysis pipeline.
//! - Exercise realistic curves (polydisperse spheres, Guinier-Porod
//!   aggregates, structureless backgrounds) rather than hand-made feature
//!   vectors only.
//!
//! Coverage
//! --------
//! - `profiling`: scale invariance on a composite curve.
//! - `training`: target selection, skipped single-class targets, grouped
//!   cross-validation and its reproducibility, `update` without new labels.
//! - `store`: save/load round trip preserving predictions.
//! - `prediction` and `pipeline`: the parameter key set, the unidentified
//!   short-circuit and recovery of sphere intensities.
//!
//! Exclusions
//! ----------
//! - Accuracy of trained models on real data; that depends on the training
//!   corpus, not on the code.
//! - Python bindings.
use std::sync::Arc;

use ndarray::{Array1, Array2};
use rust_saxs::{
    estimators::{Estimator, RegressionLoss, SgdClassifier, SgdParams, SgdRegressor, StandardScaler},
    fitting::FitOptions,
    physics::{guinier_porod, lorentzian_peak, spherical_normal},
    pipeline::SaxsPipeline,
    populations::{
        ModelTarget, ParameterEstimate, ParameterKind, PopulationFlags, PopulationKind,
    },
    prediction::{PredictError, SaxsClassifier, SaxsRegressor, evaluate_target},
    profiling::{FeatureKey, FeatureVector, detailed_profile, profile},
    spectrum::Spectrum,
    store::{self, ModelArtifact, ModelStore},
    training::{
        TargetOutcome, TargetSelection, TrainError, TrainOptions, Trainer, TrainingRecord,
        cv::{CvStrategy, choose_strategy, split},
    },
};

const N_EXPERIMENTS: usize = 6;
const PER_EXPERIMENT: usize = 6;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn q_grid() -> Array1<f64> {
    Array1::linspace(0.01, 0.3, 200)
}

fn sphere(i0: f64, r0: f64, sigma: f64, floor: f64) -> Spectrum {
    let q = q_grid();
    let i = spherical_normal(q.view(), i0, r0, sigma) + floor;
    Spectrum::new(q, i).unwrap()
}

fn aggregate(rg: f64) -> Spectrum {
    let q = q_grid();
    let i = guinier_porod(q.view(), 50.0, rg, 3.5) + 0.01;
    Spectrum::new(q, i).unwrap()
}

fn background(phase: f64) -> Spectrum {
    let q = q_grid();
    let i = q.mapv(|qv| 1.0 + 0.3 * (37.0 * qv + phase).sin());
    Spectrum::new(q, i).unwrap()
}

/// Base and both detailed profiles of `spectrum`.
fn all_features(spectrum: &Spectrum) -> FeatureVector {
    let mut fv = profile(spectrum).unwrap();
    for kind in [PopulationKind::SphericalNormal, PopulationKind::GuinierPorod] {
        fv.extend(&detailed_profile(spectrum, kind).unwrap());
    }
    fv
}

/// Purpose
/// -------
/// Labelled records built from profiled synthetic spectra.
///
/// Layout
/// ------
/// - `N_EXPERIMENTS` experiments of `PER_EXPERIMENT` spectra each.
/// - Spectra cycle sphere / aggregate / background, so every experiment
///   holds two of each and no diffraction peaks are ever labelled.
fn training_records() -> Vec<TrainingRecord> {
    let mut out = Vec::new();
    for e in 0..N_EXPERIMENTS {
        for j in 0..PER_EXPERIMENT {
            let i = e * PER_EXPERIMENT + j;
            let step = i as f64;
            let (spectrum, flags, params): (Spectrum, PopulationFlags, ParameterEstimate) =
                match i % 3 {
                    0 => {
                        let (r0, sigma) = (25.0 + 0.8 * step, 0.05 + 0.01 * (i % 4) as f64);
                        (
                            sphere(1e3, r0, sigma, 0.05),
                            PopulationFlags::with_populations(&[PopulationKind::SphericalNormal]),
                            [(ParameterKind::R0Sphere, r0), (ParameterKind::SigmaSphere, sigma)]
                                .into_iter()
                                .collect(),
                        )
                    }
                    1 => {
                        let rg = 15.0 + 0.6 * step;
                        (
                            aggregate(rg),
                            PopulationFlags::with_populations(&[PopulationKind::GuinierPorod]),
                            [(ParameterKind::RgGp, rg)].into_iter().collect(),
                        )
                    }
                    _ => (background(step), PopulationFlags::unidentified(), ParameterEstimate::new()),
                };
            out.push(TrainingRecord::new(format!("exp{e}"), all_features(&spectrum), flags, params));
        }
    }
    out
}

fn trainer() -> Trainer {
    Trainer::new(TrainOptions::default().with_seed(7))
}

/// Classifier over the target's feature layout that fires when the first
/// feature is positive (`fires == true`) or never for real spectra.
fn threshold_classifier(kind: PopulationKind, fires: bool) -> (ModelTarget, ModelArtifact) {
    let target = ModelTarget::Classifier(kind);
    let features = FeatureKey::for_target(target);
    let x = Array2::from_shape_fn((40, features.len()), |(i, j)| {
        if j == 0 { -2.0 + 4.0 * i as f64 / 39.0 } else { 0.0 }
    });
    let y = x.column(0).mapv(|v| if (v > 0.0) == fires { 1.0 } else { 0.0 });
    let scaler = StandardScaler::fit(x.view()).unwrap();
    let xs = scaler.transform(x.view()).unwrap();
    let clf = SgdClassifier::fit(xs.view(), y.view(), SgdParams::default()).unwrap();
    (target, ModelArtifact::new(features, scaler, Estimator::from(clf), 1.0).unwrap())
}

/// Regressor predicting `value` for every input.
fn constant_regressor(param: ParameterKind, value: f64) -> (ModelTarget, ModelArtifact) {
    let target = ModelTarget::Regressor(param);
    let features = FeatureKey::for_target(target);
    let x = Array2::from_shape_fn((10, features.len()), |(i, j)| if j == 0 { i as f64 } else { 0.0 });
    let y = Array1::from_elem(10, value);
    let scaler = StandardScaler::fit(x.view()).unwrap();
    let xs = scaler.transform(x.view()).unwrap();
    let reg =
        SgdRegressor::fit(xs.view(), y.view(), RegressionLoss::Squared, SgdParams::default()).unwrap();
    (target, ModelArtifact::new(features, scaler, Estimator::from(reg), 0.0).unwrap())
}

fn store_of(artifacts: Vec<(ModelTarget, ModelArtifact)>) -> ModelStore {
    let mut s = ModelStore::new();
    for (target, artifact) in artifacts {
        s.insert(target, artifact);
    }
    s
}

#[test]
// Purpose
// -------
// Descriptors of a composite curve do not depend on the absolute intensity
// scale.
fn profile_of_composite_curve_is_scale_invariant() {
    let q = q_grid();
    let i = guinier_porod(q.view(), 50.0, 25.0, 3.5) + lorentzian_peak(q.view(), 0.2, 4.0, 0.005)
        + spherical_normal(q.view(), 200.0, 30.0, 0.1)
        + 0.01;
    let s = Spectrum::new(q, i).unwrap();

    let base = profile(&s).unwrap();
    let scaled = profile(&s.scale_intensity(123.0).unwrap()).unwrap();

    for key in FeatureKey::BASE {
        let (a, b) = (base.get(key).unwrap(), scaled.get(key).unwrap());
        assert!((a - b).abs() <= 1e-6 * a.abs().max(1.0), "{key}: {a} vs {b}");
    }
}

#[test]
fn five_groups_yield_ten_leave_two_out_folds() {
    let groups: Vec<String> =
        ["a", "a", "b", "b", "c", "c", "d", "d", "e", "e"].iter().map(|g| g.to_string()).collect();

    let strategy = choose_strategy(&groups, 5, 2, 5);
    let folds = split(&groups, strategy, 0);

    assert_eq!(strategy, CvStrategy::LeaveGroupsOut { n: 2 });
    assert_eq!(folds.len(), 10);
    for fold in &folds {
        assert_eq!(fold.test.len(), 4);
        assert_eq!(fold.train.len(), 6);
    }
}

#[test]
// Purpose
// -------
// Training on profiled synthetic spectra produces a model for every target
// with two classes or enough labels, and skips diffraction peaks, which are
// never labelled.
//
// Given
// -----
// - Six experiments mixing spheres, aggregates and backgrounds.
//
// Expect
// ------
// - Six artifacts; the peak classifier skipped with `SingleClass`.
// - Fifteen leave-two-experiments-out folds per trained target.
// - Identical cross-validation scores across two runs with the same seed.
fn training_covers_every_labelled_target_reproducibly() {
    init_logging();
    let records = training_records();

    let run = trainer().train(&records, false, TargetSelection::All);
    let again = trainer().train(&records, false, TargetSelection::All);

    assert_eq!(
        run.get(ModelTarget::Classifier(PopulationKind::DiffractionPeaks)),
        Some(&TargetOutcome::Skipped(TrainError::SingleClass {
            target: ModelTarget::Classifier(PopulationKind::DiffractionPeaks)
        }))
    );
    for (target, outcome) in run.iter() {
        if target == ModelTarget::Classifier(PopulationKind::DiffractionPeaks) {
            continue;
        }
        let TargetOutcome::Trained(trained) = outcome else {
            panic!("{target} was not trained: {outcome:?}");
        };
        let cv = trained.cv.as_ref().unwrap();
        assert_eq!(cv.fold_scores.len(), 15, "{target}");
        let direct = cv.fold_scores.iter().sum::<f64>() / cv.fold_scores.len() as f64;
        assert!((cv.mean - direct).abs() < 1e-12, "{target}");
        assert_eq!(trained.artifact.accuracy, cv.mean);

        let Some(TargetOutcome::Trained(other)) = again.get(target) else {
            panic!("{target} missing from the second run");
        };
        assert_eq!(other.cv, trained.cv, "{target} is not reproducible");
    }
    assert_eq!(run.into_store().len(), 6);
}

#[test]
// Purpose
// -------
// A store written to disk and read back predicts exactly what the original
// store predicts, and the regressor returns one value per regressed
// parameter of the flagged populations.
fn saved_store_predicts_like_the_original() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.yaml");
    let original = trainer().train(&training_records(), false, TargetSelection::All).into_store();

    store::save(&original, &path).unwrap();
    let loaded = store::load(&path).unwrap();

    assert!(loaded.warnings.is_empty());
    assert!(loaded.corrupt.is_empty());
    assert_eq!(loaded.store.len(), original.len());

    let sample = sphere(800.0, 33.0, 0.07, 0.05);
    let features = profile(&sample).unwrap();
    let flags = PopulationFlags::with_populations(&[
        PopulationKind::SphericalNormal,
        PopulationKind::GuinierPorod,
    ]);
    let original = Arc::new(original);
    let reloaded = Arc::new(loaded.store);

    // The peak classifier was never trained, so compare the stored
    // classifiers one by one; full classification needs all of them.
    let mut compared = 0;
    for (target, _) in original.iter().filter(|(t, _)| t.is_classifier()) {
        let a = evaluate_target(&original, target, &features).unwrap();
        let b = evaluate_target(&reloaded, target, &features).unwrap();
        assert!((a - b).abs() < 1e-12, "{target}: {a} vs {b}");
        compared += 1;
    }
    assert_eq!(compared, 3);
    assert!(matches!(
        SaxsClassifier::new(Arc::clone(&reloaded)).classify(&features),
        Err(PredictError::ModelNotLoaded {
            target: ModelTarget::Classifier(PopulationKind::DiffractionPeaks)
        })
    ));

    let params_a = SaxsRegressor::new(original).predict_params(&flags, &features, &sample).unwrap();
    let params_b = SaxsRegressor::new(reloaded).predict_params(&flags, &features, &sample).unwrap();
    let keys: Vec<ParameterKind> = params_a.keys().collect();
    assert_eq!(
        keys,
        vec![ParameterKind::RgGp, ParameterKind::R0Sphere, ParameterKind::SigmaSphere]
    );
    for (param, a) in params_a.iter() {
        let b = params_b.get(param).unwrap();
        assert!((a - b).abs() < 1e-9, "{param}: {a} vs {b}");
    }
}

#[test]
// Purpose
// -------
// Warm-starting on a batch without any usable label leaves every stored
// model untouched and reports absent models as skipped.
fn update_without_new_labels_keeps_the_store() {
    init_logging();
    let records = training_records();
    let store = trainer().train(&records, false, TargetSelection::All).into_store();

    let run = trainer().update(&[], &store, &records);

    for (target, outcome) in run.iter() {
        match store.get(target) {
            Some(prior) => assert_eq!(outcome, &TargetOutcome::Unchanged(prior.clone())),
            None => assert_eq!(
                outcome,
                &TargetOutcome::Skipped(TrainError::NoPriorModel { target })
            ),
        }
    }
    assert!(run.regressed_targets().is_empty());
    assert_eq!(run.into_store(), store);
}

#[test]
fn unidentified_spectrum_stops_after_classification() {
    let store = store_of(vec![threshold_classifier(PopulationKind::Unidentified, true)]);
    let pipeline = SaxsPipeline::new(Arc::new(store), FitOptions::default());

    let analysis = pipeline.analyze(&background(0.0)).unwrap();

    assert!(analysis.flags.is_unidentified());
    assert!(analysis.flags.identified().is_empty());
    assert!(analysis.params.is_empty());
    assert!(analysis.fit.is_none());
}

#[test]
// Purpose
// -------
// With spheres flagged and exact shape estimates, the pipeline recovers
// the sphere intensity of a noiseless curve.
//
// Given
// -----
// - I0 = 1000, r0 = 40, σ = 0.05 and a flat floor of 0.5.
// - Classifiers flagging spheres only; regressors returning r0 = 40 and
//   σ = 0.05.
//
// Expect
// ------
// - A converged fit with `I0_sphere` within 5% of 1000.
fn sphere_intensity_is_recovered_through_the_pipeline() {
    init_logging();
    let store = store_of(vec![
        threshold_classifier(PopulationKind::Unidentified, false),
        threshold_classifier(PopulationKind::SphericalNormal, true),
        threshold_classifier(PopulationKind::GuinierPorod, false),
        threshold_classifier(PopulationKind::DiffractionPeaks, false),
        constant_regressor(ParameterKind::R0Sphere, 40.0),
        constant_regressor(ParameterKind::SigmaSphere, 0.05),
    ]);
    let pipeline = SaxsPipeline::new(Arc::new(store), FitOptions::default());

    let analysis = pipeline.analyze(&sphere(1000.0, 40.0, 0.05, 0.5)).unwrap();

    assert_eq!(analysis.flags.identified(), vec![PopulationKind::SphericalNormal]);
    let report = analysis.fit.as_ref().unwrap();
    assert!(report.converged, "status: {}", report.status);
    let i0 = analysis.params.get(ParameterKind::I0Sphere).unwrap();
    assert!((i0 - 1000.0).abs() / 1000.0 < 0.05, "I0_sphere = {i0}");
    assert!(analysis.confidence.get(PopulationKind::SphericalNormal).unwrap() > 0.5);
}
