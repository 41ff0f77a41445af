//! Small trained artifacts for inference tests.
use ndarray::{Array1, Array2};

use crate::{
    estimators::{Estimator, Penalty, RegressionLoss, SgdClassifier, SgdParams, SgdRegressor, StandardScaler},
    populations::{ModelTarget, ParameterKind, PopulationKind},
    profiling::{FeatureKey, FeatureVector},
    store::{ModelArtifact, ModelStore},
};

const ROWS: usize = 40;

/// Training rows whose first column sweeps [-2, 2]; every other column is
/// constant, so its scaled value is zero and its weight never moves. Models
/// built here therefore depend on the first feature only, even when they are
/// fed profiles of real spectra.
fn design(n_features: usize) -> Array2<f64> {
    Array2::from_shape_fn((ROWS, n_features), |(i, j)| {
        if j == 0 { -2.0 + 4.0 * i as f64 / (ROWS - 1) as f64 } else { 0.0 }
    })
}

fn classifier_artifact(target: ModelTarget, positive_when_high: bool) -> ModelArtifact {
    let features = FeatureKey::for_target(target);
    let x = design(features.len());
    let y = x.column(0).mapv(|v| if (v > 0.0) == positive_when_high { 1.0 } else { 0.0 });
    let scaler = StandardScaler::fit(x.view()).unwrap();
    let xs = scaler.transform(x.view()).unwrap();
    let clf = SgdClassifier::fit(xs.view(), y.view(), SgdParams::default()).unwrap();
    ModelArtifact::new(features, scaler, Estimator::from(clf), 1.0).unwrap()
}

fn regressor_artifact(target: ModelTarget, intercept: f64, slope: f64) -> ModelArtifact {
    let features = FeatureKey::for_target(target);
    let x = design(features.len());
    let y: Array1<f64> = x.column(0).mapv(|v| intercept + slope * v);
    let scaler = StandardScaler::fit(x.view()).unwrap();
    let xs = scaler.transform(x.view()).unwrap();
    let params = SgdParams {
        tol: 1e-9,
        ..SgdParams::new(Penalty::None, 0.0, 0.0).unwrap().with_max_epochs(1000)
    };
    let reg = SgdRegressor::fit(xs.view(), y.view(), RegressionLoss::Squared, params).unwrap();
    ModelArtifact::new(features, scaler, Estimator::from(reg), 0.0).unwrap()
}

/// Store with classifiers `(population, fires_on_high_first_feature)` and
/// linear regressors `(parameter, intercept, slope)` in the first feature.
pub(crate) fn store_with(
    classifiers: &[(PopulationKind, bool)], regressors: &[(ParameterKind, f64, f64)],
) -> ModelStore {
    let mut store = ModelStore::new();
    for &(kind, high) in classifiers {
        let target = ModelTarget::Classifier(kind);
        store.insert(target, classifier_artifact(target, high));
    }
    for &(param, intercept, slope) in regressors {
        let target = ModelTarget::Regressor(param);
        store.insert(target, regressor_artifact(target, intercept, slope));
    }
    store
}

/// Every feature key at zero except the first base feature.
pub(crate) fn feature_vector(first: f64) -> FeatureVector {
    FeatureKey::all().map(|k| (k, if k == FeatureKey::BASE[0] { first } else { 0.0 })).collect()
}
