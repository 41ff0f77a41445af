//! Offline training and warm-start updating of every model target.
//!
//! Purpose
//! -------
//! Build [`ModelArtifact`]s from labelled records. [`Trainer::train`] fits
//! from scratch with cross-validation (and optionally a grid search);
//! [`Trainer::update`] refines existing artifacts with new records and
//! re-evaluates them.
//!
//! Key behaviors
//! -------------
//! - Targets are processed in canonical order and independently: a target
//!   that cannot be trained is `Skipped`, one that errors is `Failed`, and
//!   neither affects its siblings.
//! - `update` never touches a target without new eligible rows; it is
//!   reported `Unchanged` with its prior artifact.
//! - A worse metric after `update` sets `regressed`; callers are expected to
//!   retrain that target with `train`.
//!
//! Downstream usage
//! ----------------
//! - `TrainingRun::into_store` yields the [`ModelStore`] consumed by
//!   inference and by `store::save`.
use std::collections::BTreeMap;

use crate::{
    populations::ModelTarget,
    store::{CRATE_VERSION, ModelArtifact, ModelStore},
    training::{
        cv::{choose_strategy, split},
        dataset::TargetDataset,
        errors::{TrainError, TrainResult},
        options::TrainOptions,
        records::TrainingRecord,
        search::{CvReport, Hyperparameters, cross_validate, grid_search, score},
    },
};

/// Which targets a training run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelection {
    All,
    Only(ModelTarget),
}

impl TargetSelection {
    fn targets(self) -> Vec<ModelTarget> {
        match self {
            TargetSelection::All => ModelTarget::ALL.to_vec(),
            TargetSelection::Only(t) => vec![t],
        }
    }
}

/// A freshly trained or updated artifact and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedTarget {
    pub artifact: ModelArtifact,
    /// Chosen configuration; `None` for warm-start updates.
    pub hyperparameters: Option<Hyperparameters>,
    /// Cross-validation of a full fit; `None` for updates.
    pub cv: Option<CvReport>,
    /// Metric of the artifact an update started from.
    pub previous_metric: Option<f64>,
    /// The update made the metric worse.
    pub regressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Trained(Box<TrainedTarget>),
    /// No new rows for an update; the prior artifact is kept as is.
    Unchanged(ModelArtifact),
    /// Label requirements not met, or nothing to update.
    Skipped(TrainError),
    Failed(TrainError),
}

impl TargetOutcome {
    /// Artifact to keep for this target, if any.
    pub fn artifact(&self) -> Option<&ModelArtifact> {
        match self {
            TargetOutcome::Trained(t) => Some(&t.artifact),
            TargetOutcome::Unchanged(a) => Some(a),
            TargetOutcome::Skipped(_) | TargetOutcome::Failed(_) => None,
        }
    }
}

/// Per-target outcomes of one `train` or `update` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingRun {
    outcomes: BTreeMap<ModelTarget, TargetOutcome>,
}

impl TrainingRun {
    pub fn get(&self, target: ModelTarget) -> Option<&TargetOutcome> {
        self.outcomes.get(&target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelTarget, &TargetOutcome)> + '_ {
        self.outcomes.iter().map(|(&t, o)| (t, o))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Targets whose update worsened the metric.
    pub fn regressed_targets(&self) -> Vec<ModelTarget> {
        self.iter()
            .filter(|(_, o)| matches!(o, TargetOutcome::Trained(t) if t.regressed))
            .map(|(t, _)| t)
            .collect()
    }

    /// Store holding every trained or unchanged artifact.
    pub fn into_store(self) -> ModelStore {
        let mut store = ModelStore::new();
        for (target, outcome) in self.outcomes {
            match outcome {
                TargetOutcome::Trained(t) => {
                    store.insert(target, t.artifact);
                }
                TargetOutcome::Unchanged(a) => {
                    store.insert(target, a);
                }
                TargetOutcome::Skipped(_) | TargetOutcome::Failed(_) => {}
            }
        }
        store
    }
}

#[derive(Debug, Clone, Default)]
pub struct Trainer {
    opts: TrainOptions,
}

impl Trainer {
    pub fn new(opts: TrainOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &TrainOptions {
        &self.opts
    }

    /// Fit the selected targets from scratch.
    ///
    /// With `search_hyperparameters` each target runs the full grid of
    /// [`Hyperparameters::grid`]; otherwise [`Hyperparameters::default_for`].
    /// The recorded metric is the cross-validated mean of the chosen
    /// configuration; the stored estimator is refitted on every eligible row.
    pub fn train(
        &self, records: &[TrainingRecord], search_hyperparameters: bool, selection: TargetSelection,
    ) -> TrainingRun {
        let mut run = TrainingRun::default();
        for target in selection.targets() {
            let outcome = self.train_target(records, target, search_hyperparameters);
            log_outcome(target, &outcome);
            run.outcomes.insert(target, outcome);
        }
        run
    }

    /// Warm-start every target of `store` on `new_records` and evaluate the
    /// result on `eval_records`.
    pub fn update(
        &self, new_records: &[TrainingRecord], store: &ModelStore, eval_records: &[TrainingRecord],
    ) -> TrainingRun {
        let mut run = TrainingRun::default();
        for target in ModelTarget::ALL {
            let outcome = match store.get(target) {
                None => TargetOutcome::Skipped(TrainError::NoPriorModel { target }),
                Some(prior) => match update_artifact(target, prior, new_records, eval_records) {
                    Ok(outcome) => outcome,
                    Err(e) => TargetOutcome::Failed(e),
                },
            };
            log_outcome(target, &outcome);
            run.outcomes.insert(target, outcome);
        }
        run
    }

    fn train_target(
        &self, records: &[TrainingRecord], target: ModelTarget, search: bool,
    ) -> TargetOutcome {
        let data = TargetDataset::for_target(records, target);
        if let Err(e) = data.check_trainable() {
            return TargetOutcome::Skipped(e);
        }
        match self.fit_dataset(&data, search) {
            Ok(trained) => TargetOutcome::Trained(Box::new(trained)),
            Err(e) => TargetOutcome::Failed(e),
        }
    }

    fn fit_dataset(&self, data: &TargetDataset, search: bool) -> TrainResult<TrainedTarget> {
        let o = &self.opts;
        let target = data.target;
        let strategy = choose_strategy(&data.groups, o.min_groups, o.n_groups_out, o.k_folds);
        let folds = split(&data.groups, strategy, o.seed);
        let (hp, cv) = if search {
            let grid: Vec<Hyperparameters> = Hyperparameters::grid(target)
                .into_iter()
                .map(|hp| hp.with_schedule(o.seed, o.max_epochs))
                .collect();
            grid_search(data, &grid, &folds, o.parallel)?
        } else {
            let hp = Hyperparameters::default_for(target).with_schedule(o.seed, o.max_epochs);
            let cv = cross_validate(data, &hp, &folds, o.parallel)?;
            (hp, cv)
        };
        let (scaler, estimator) = hp.fit(target, data.x.view(), data.y.view())?;
        let artifact = ModelArtifact::new(data.features.clone(), scaler, estimator, cv.mean)
            .map_err(|error| TrainError::Estimator { target, error })?;
        Ok(TrainedTarget {
            artifact,
            hyperparameters: Some(hp),
            cv: Some(cv),
            previous_metric: None,
            regressed: false,
        })
    }
}

fn update_artifact(
    target: ModelTarget, prior: &ModelArtifact, new_records: &[TrainingRecord],
    eval_records: &[TrainingRecord],
) -> TrainResult<TargetOutcome> {
    let wrap = |error| TrainError::Estimator { target, error };
    let new = TargetDataset::collect(new_records, target, &prior.features);
    if new.is_empty() {
        return Ok(TargetOutcome::Unchanged(prior.clone()));
    }

    let mut artifact = prior.clone();
    artifact.scaler.partial_fit(new.x.view()).map_err(wrap)?;
    let xs = artifact.scaler.transform(new.x.view()).map_err(wrap)?;
    artifact.estimator.partial_fit(xs.view(), new.y.view()).map_err(wrap)?;

    let eval = TargetDataset::collect(eval_records, target, &prior.features);
    let label_std = eval.label_std();
    let metric = if eval.is_empty() || (!target.is_classifier() && label_std <= 0.0) {
        log::warn!("'{target}': no usable evaluation rows, keeping the previous metric");
        prior.accuracy
    } else {
        score(target, &artifact.scaler, &artifact.estimator, eval.x.view(), eval.y.view(), label_std)?
    };
    let regressed =
        if target.is_classifier() { metric < prior.accuracy } else { metric > prior.accuracy };
    artifact.version = CRATE_VERSION.to_string();
    artifact.accuracy = metric;
    Ok(TargetOutcome::Trained(Box::new(TrainedTarget {
        artifact,
        hyperparameters: None,
        cv: None,
        previous_metric: Some(prior.accuracy),
        regressed,
    })))
}

fn log_outcome(target: ModelTarget, outcome: &TargetOutcome) {
    match outcome {
        TargetOutcome::Trained(t) if t.regressed => log::warn!(
            "'{target}': metric went from {:.4} to {:.4} after update; retrain recommended",
            t.previous_metric.unwrap_or(f64::NAN),
            t.artifact.accuracy
        ),
        TargetOutcome::Trained(t) => log::info!("'{target}': metric {:.4}", t.artifact.accuracy),
        TargetOutcome::Unchanged(_) => log::info!("'{target}': no new rows, unchanged"),
        TargetOutcome::Skipped(e) => log::info!("'{target}' skipped: {e}"),
        TargetOutcome::Failed(e) => log::warn!("'{target}' failed: {e}"),
    }
}
