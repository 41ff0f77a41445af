//! Per-target design matrices assembled from training records.
use ndarray::{Array1, Array2, Axis};

use crate::{
    populations::{ModelTarget, PopulationKind},
    profiling::FeatureKey,
    training::{
        errors::{TrainError, TrainResult},
        records::TrainingRecord,
    },
};

/// A regressor needs more than four labelled rows.
pub const MIN_REGRESSION_ROWS: usize = 5;

/// Eligible rows of one target: raw features, labels and group ids.
///
/// Eligibility:
/// - `unidentified` classifier: every row, label = the unidentified flag.
/// - other classifiers: rows not flagged unidentified, label = the flag.
/// - regressors: rows whose owning population is flagged and that carry a
///   finite value for the parameter.
///
/// Rows lacking any required feature, or with a non-finite one, are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDataset {
    pub target: ModelTarget,
    pub features: Vec<FeatureKey>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub groups: Vec<String>,
}

impl TargetDataset {
    /// Collect the eligible rows of `records` for `target` over `features`.
    pub fn collect(records: &[TrainingRecord], target: ModelTarget, features: &[FeatureKey]) -> Self {
        let mut values = Vec::new();
        let mut y = Vec::new();
        let mut groups = Vec::new();
        for record in records {
            let Some(label) = label_of(record, target) else { continue };
            let Ok(row) = record.features.select(features) else { continue };
            if row.iter().any(|v| !v.is_finite()) {
                continue;
            }
            values.extend(row);
            y.push(label);
            groups.push(record.experiment_id.clone());
        }
        let x = Array2::from_shape_vec((y.len(), features.len()), values)
            .unwrap_or_else(|_| Array2::zeros((0, features.len())));
        Self { target, features: features.to_vec(), x, y: Array1::from(y), groups }
    }

    /// Rows for `target` over its canonical feature layout.
    pub fn for_target(records: &[TrainingRecord], target: ModelTarget) -> Self {
        Self::collect(records, target, &FeatureKey::for_target(target))
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Check the label requirements for fitting from scratch.
    ///
    /// # Errors
    /// - [`TrainError::NoTrainableRows`] with no eligible row.
    /// - [`TrainError::SingleClass`] for a classifier with one label.
    /// - [`TrainError::TooFewLabels`] for a regressor with fewer than
    ///   [`MIN_REGRESSION_ROWS`] rows.
    /// - [`TrainError::DegenerateTarget`] for constant regressor targets.
    pub fn check_trainable(&self) -> TrainResult<()> {
        let target = self.target;
        if self.is_empty() {
            return Err(TrainError::NoTrainableRows { target });
        }
        if target.is_classifier() {
            let positives = self.y.iter().filter(|&&v| v == 1.0).count();
            if positives == 0 || positives == self.len() {
                return Err(TrainError::SingleClass { target });
            }
        } else {
            if self.len() < MIN_REGRESSION_ROWS {
                return Err(TrainError::TooFewLabels {
                    target,
                    found: self.len(),
                    required: MIN_REGRESSION_ROWS,
                });
            }
            if self.label_std() <= 0.0 {
                return Err(TrainError::DegenerateTarget { target });
            }
        }
        Ok(())
    }

    /// Sample standard deviation of the labels (`0` below two rows).
    pub fn label_std(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }
        self.y.std(1.0)
    }

    /// Rows at `idx`, in that order.
    pub fn rows(&self, idx: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (self.x.select(Axis(0), idx), self.y.select(Axis(0), idx))
    }
}

fn label_of(record: &TrainingRecord, target: ModelTarget) -> Option<f64> {
    let as_label = |b: bool| if b { 1.0 } else { 0.0 };
    match target {
        ModelTarget::Classifier(PopulationKind::Unidentified) => {
            Some(as_label(record.flags.is_unidentified()))
        }
        ModelTarget::Classifier(kind) => {
            (!record.flags.is_unidentified()).then(|| as_label(record.flags.get(kind)))
        }
        ModelTarget::Regressor(param) => {
            let owner_flagged = param.owner().map_or(true, |p| record.flags.get(p));
            if !owner_flagged {
                return None;
            }
            record.params.get(param).filter(|v| v.is_finite())
        }
    }
}
