//! training — offline fitting of the population classifiers and parameter
//! regressors.
//!
//! Purpose
//! -------
//! Turn labelled [`TrainingRecord`]s into a [`ModelStore`](crate::store::ModelStore):
//! assemble per-target datasets, cross-validate, optionally grid-search the
//! SGD hyperparameters, and refit on all eligible rows. Existing stores can
//! be refined with new records through a warm-start update.
//!
//! Key behaviors
//! -------------
//! - Records come from any [`RecordSource`]; [`CsvRecordSource`] reads one
//!   table per dataset id and [`InMemoryRecordSource`] serves tests and
//!   callers that already hold records.
//! - Cross-validation is Leave-2-Groups-Out over experiment ids when there
//!   are at least five experiments and a seeded 5-fold split otherwise.
//! - Folds and grid trials run on the rayon pool; every fit is seeded, so a
//!   run is reproducible regardless of scheduling.
//!
//! Testing notes
//! -------------
//! - Submodules carry unit tests on synthetic records; the integration test
//!   trains on profiled synthetic spectra end to end.
pub mod cv;
pub mod dataset;
pub mod errors;
pub mod options;
pub mod records;
pub mod search;
pub mod trainer;

pub use self::cv::{CvStrategy, Fold};
pub use self::dataset::{MIN_REGRESSION_ROWS, TargetDataset};
pub use self::errors::{DataError, DataResult, TrainError, TrainResult};
pub use self::options::TrainOptions;
pub use self::records::{
    CsvRecordSource, InMemoryRecordSource, NULL_MARKERS, RecordSource, TrainingRecord,
    shuffle_records,
};
pub use self::search::{CvReport, Hyperparameters};
pub use self::trainer::{TargetOutcome, TargetSelection, TrainedTarget, Trainer, TrainingRun};
