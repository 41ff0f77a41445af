//! Hyperparameters, search grids and cross-validated scoring.
//!
//! Purpose
//! -------
//! Describe one candidate model ([`Hyperparameters`]), fit it on a subset of
//! a [`TargetDataset`] and score it with the target's metric:
//! accuracy for classifiers (higher is better) and mean absolute error
//! normalised by the label standard deviation for regressors (lower is
//! better).
//!
//! Key behaviors
//! -------------
//! - [`Hyperparameters::default_for`] holds the per-target defaults used
//!   without search; [`Hyperparameters::grid`] the exhaustive search grid.
//! - [`cross_validate`] fits a fresh scaler and estimator per fold and
//!   averages the fold scores. Folds run on the rayon pool when asked; the
//!   fold order of the scores does not depend on scheduling.
//! - [`grid_search`] returns the best candidate, ties going to the first in
//!   grid order.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every fit is seeded, so identical inputs give identical scores.
//! - A classifier fold whose training rows hold one label predicts that
//!   label for the whole test fold.
use rayon::prelude::*;

use crate::{
    estimators::{
        Estimator, EstimatorError, Penalty, RegressionLoss, SgdClassifier, SgdParams, SgdRegressor,
        StandardScaler,
    },
    populations::{ModelTarget, PopulationKind},
    training::{
        cv::Fold,
        dataset::TargetDataset,
        errors::{TrainError, TrainResult},
    },
};

const CLASSIFIER_ALPHAS: [f64; 5] = [1e-5, 1e-4, 1e-3, 1e-2, 1e-1];
const CLASSIFIER_L1_RATIOS: [f64; 5] = [0.0, 0.15, 0.5, 0.85, 1.0];
const REGRESSOR_EPSILONS: [f64; 5] = [1.0, 0.1, 0.01, 0.001, 0.0];
const REGRESSOR_ALPHAS: [f64; 3] = [1e-4, 1e-3, 1e-2];
const REGRESSOR_L1_RATIOS: [f64; 4] = [0.0, 0.15, 0.5, 0.95];

/// One candidate model configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hyperparameters {
    Classifier(SgdParams),
    Regressor { loss: RegressionLoss, params: SgdParams },
}

impl Hyperparameters {
    /// Configuration used when no search is requested.
    pub fn default_for(target: ModelTarget) -> Self {
        let classifier = |penalty, alpha, l1_ratio| {
            Hyperparameters::Classifier(SgdParams { penalty, alpha, l1_ratio, ..SgdParams::default() })
        };
        match target {
            ModelTarget::Classifier(
                PopulationKind::Unidentified | PopulationKind::SphericalNormal,
            ) => classifier(Penalty::L1, 1e-3, 1.0),
            ModelTarget::Classifier(PopulationKind::GuinierPorod) => {
                classifier(Penalty::ElasticNet, 1e-2, 0.85)
            }
            ModelTarget::Classifier(PopulationKind::DiffractionPeaks) => {
                classifier(Penalty::ElasticNet, 1e-3, 0.85)
            }
            ModelTarget::Regressor(_) => Hyperparameters::Regressor {
                loss: RegressionLoss::Squared,
                params: SgdParams::default(),
            },
        }
    }

    /// Exhaustive search grid in canonical order.
    ///
    /// Classifiers: penalty × alpha × l1_ratio. Regressors: loss (Huber per
    /// epsilon, then squared) × penalty × alpha × l1_ratio; the squared loss
    /// ignores epsilon and appears once.
    pub fn grid(target: ModelTarget) -> Vec<Self> {
        if target.is_classifier() {
            let mut out = Vec::new();
            for penalty in Penalty::ALL {
                for alpha in CLASSIFIER_ALPHAS {
                    for l1_ratio in CLASSIFIER_L1_RATIOS {
                        out.push(Hyperparameters::Classifier(SgdParams {
                            penalty,
                            alpha,
                            l1_ratio,
                            ..SgdParams::default()
                        }));
                    }
                }
            }
            return out;
        }
        let losses = REGRESSOR_EPSILONS
            .into_iter()
            .map(|epsilon| RegressionLoss::Huber { epsilon })
            .chain(std::iter::once(RegressionLoss::Squared));
        let mut out = Vec::new();
        for loss in losses {
            for penalty in Penalty::ALL {
                for alpha in REGRESSOR_ALPHAS {
                    for l1_ratio in REGRESSOR_L1_RATIOS {
                        let params = SgdParams { penalty, alpha, l1_ratio, ..SgdParams::default() };
                        out.push(Hyperparameters::Regressor { loss, params });
                    }
                }
            }
        }
        out
    }

    pub fn params(&self) -> &SgdParams {
        match self {
            Hyperparameters::Classifier(p) => p,
            Hyperparameters::Regressor { params, .. } => params,
        }
    }

    /// Same configuration with the given seed and epoch cap.
    pub fn with_schedule(mut self, seed: u64, max_epochs: usize) -> Self {
        let p = match &mut self {
            Hyperparameters::Classifier(p) => p,
            Hyperparameters::Regressor { params, .. } => params,
        };
        p.seed = seed;
        p.max_epochs = max_epochs;
        self
    }

    /// Fit a scaler and an estimator on raw rows.
    ///
    /// # Errors
    /// [`TrainError::Estimator`] when the estimator rejects the data.
    pub fn fit(
        &self, target: ModelTarget, x: ndarray::ArrayView2<'_, f64>, y: ndarray::ArrayView1<'_, f64>,
    ) -> TrainResult<(StandardScaler, Estimator)> {
        let wrap = |error: EstimatorError| TrainError::Estimator { target, error };
        let scaler = StandardScaler::fit(x).map_err(wrap)?;
        let xs = scaler.transform(x).map_err(wrap)?;
        let estimator = match *self {
            Hyperparameters::Classifier(p) => {
                Estimator::from(SgdClassifier::fit(xs.view(), y, p).map_err(wrap)?)
            }
            Hyperparameters::Regressor { loss, params } => {
                Estimator::from(SgdRegressor::fit(xs.view(), y, loss, params).map_err(wrap)?)
            }
        };
        Ok((scaler, estimator))
    }
}

/// Fold scores and their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct CvReport {
    pub fold_scores: Vec<f64>,
    pub mean: f64,
}

/// Score of a fitted scaler/estimator pair on raw rows.
///
/// Classifiers: fraction of correct `P >= 0.5` decisions. Regressors:
/// `MAE / label_std`.
///
/// # Errors
/// Estimator dimension errors, wrapped as [`TrainError::Estimator`].
pub fn score(
    target: ModelTarget, scaler: &StandardScaler, estimator: &Estimator,
    x: ndarray::ArrayView2<'_, f64>, y: ndarray::ArrayView1<'_, f64>, label_std: f64,
) -> TrainResult<f64> {
    let wrap = |error: EstimatorError| TrainError::Estimator { target, error };
    let xs = scaler.transform(x).map_err(wrap)?;
    let mut total = 0.0;
    for (row, &truth) in xs.rows().into_iter().zip(y.iter()) {
        let out = estimator.predict(row).map_err(wrap)?;
        total += if estimator.is_classifier() {
            f64::from(u8::from((out >= 0.5) == (truth == 1.0)))
        } else {
            (out - truth).abs()
        };
    }
    let mean = total / y.len() as f64;
    Ok(if estimator.is_classifier() { mean } else { mean / label_std })
}

/// Mean fold score of `hp` on `dataset`.
///
/// # Errors
/// [`TrainError::NoTrainableRows`] without folds; the first fold error
/// otherwise.
pub fn cross_validate(
    dataset: &TargetDataset, hp: &Hyperparameters, folds: &[Fold], parallel: bool,
) -> TrainResult<CvReport> {
    if folds.is_empty() {
        return Err(TrainError::NoTrainableRows { target: dataset.target });
    }
    let label_std = dataset.label_std();
    let run = |fold: &Fold| score_fold(dataset, hp, fold, label_std);
    let fold_scores: Vec<f64> = if parallel {
        folds.par_iter().map(run).collect::<TrainResult<_>>()?
    } else {
        folds.iter().map(run).collect::<TrainResult<_>>()?
    };
    let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    Ok(CvReport { fold_scores, mean })
}

fn score_fold(
    dataset: &TargetDataset, hp: &Hyperparameters, fold: &Fold, label_std: f64,
) -> TrainResult<f64> {
    let (x_train, y_train) = dataset.rows(&fold.train);
    let (_, y_test) = dataset.rows(&fold.test);
    if let Hyperparameters::Classifier(_) = hp {
        let positives = y_train.iter().filter(|&&v| v == 1.0).count();
        if positives == 0 || positives == y_train.len() {
            let constant = if positives == 0 { 0.0 } else { 1.0 };
            let hits = y_test.iter().filter(|&&v| v == constant).count();
            return Ok(hits as f64 / y_test.len() as f64);
        }
    }
    let (x_test, _) = dataset.rows(&fold.test);
    let (scaler, estimator) = hp.fit(dataset.target, x_train.view(), y_train.view())?;
    score(dataset.target, &scaler, &estimator, x_test.view(), y_test.view(), label_std)
}

/// Best candidate of `grid` with its report.
///
/// # Errors
/// [`TrainError::InvalidHyperparameters`] for an empty grid, or the first
/// cross-validation error.
pub fn grid_search(
    dataset: &TargetDataset, grid: &[Hyperparameters], folds: &[Fold], parallel: bool,
) -> TrainResult<(Hyperparameters, CvReport)> {
    let evaluate = |hp: &Hyperparameters| cross_validate(dataset, hp, folds, false);
    let reports: Vec<CvReport> = if parallel {
        grid.par_iter().map(evaluate).collect::<TrainResult<_>>()?
    } else {
        grid.iter().map(evaluate).collect::<TrainResult<_>>()?
    };
    let higher_is_better = dataset.target.is_classifier();
    let mut best: Option<usize> = None;
    for (i, report) in reports.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) if higher_is_better => report.mean > reports[b].mean,
            Some(b) => report.mean < reports[b].mean,
        };
        if better {
            best = Some(i);
        }
    }
    match best {
        Some(i) => Ok((grid[i], reports[i].clone())),
        None => Err(TrainError::InvalidHyperparameters { reason: "empty search grid".to_string() }),
    }
}
