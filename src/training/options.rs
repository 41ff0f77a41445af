//! Training configuration.
use crate::training::errors::{TrainError, TrainResult};

/// Cross-validation, schedule and parallelism settings of a [`Trainer`](crate::training::Trainer).
///
/// Defaults: Leave-2-Groups-Out from 5 groups up, 5-fold otherwise,
/// `max_epochs = 1000`, `seed = 0`, parallel folds and grid trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainOptions {
    /// Groups held out per fold under Leave-N-Groups-Out.
    pub n_groups_out: usize,
    /// Minimum distinct experiment ids for Leave-N-Groups-Out.
    pub min_groups: usize,
    /// Fold count of the K-fold fallback.
    pub k_folds: usize,
    /// Epoch cap of every full fit.
    pub max_epochs: usize,
    /// Seed of row shuffling and SGD.
    pub seed: u64,
    /// Run folds and grid trials on the rayon pool.
    pub parallel: bool,
}

impl TrainOptions {
    /// # Errors
    /// [`TrainError::InvalidHyperparameters`] when `n_groups_out == 0`,
    /// `min_groups <= n_groups_out`, `k_folds < 2` or `max_epochs == 0`.
    pub fn new(
        n_groups_out: usize, min_groups: usize, k_folds: usize, max_epochs: usize, seed: u64,
        parallel: bool,
    ) -> TrainResult<Self> {
        let invalid = |reason: &str| Err(TrainError::InvalidHyperparameters { reason: reason.to_string() });
        if n_groups_out == 0 {
            return invalid("n_groups_out must be at least 1");
        }
        if min_groups <= n_groups_out {
            return invalid("min_groups must exceed n_groups_out");
        }
        if k_folds < 2 {
            return invalid("k_folds must be at least 2");
        }
        if max_epochs == 0 {
            return invalid("max_epochs must be at least 1");
        }
        Ok(Self { n_groups_out, min_groups, k_folds, max_epochs, seed, parallel })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self { n_groups_out: 2, min_groups: 5, k_folds: 5, max_epochs: 1000, seed: 0, parallel: true }
    }
}
