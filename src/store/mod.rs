//! store — persisted, versioned model artifacts.
//!
//! Purpose
//! -------
//! Own the trained scalers and estimators behind a [`ModelStore`] handle and
//! move them to and from a human-readable YAML document.
//!
//! Key behaviors
//! -------------
//! - [`save`] writes the document and a `<stem>_accuracy.txt` summary.
//! - [`load`] is tolerant: version differences become [`StoreWarning`]s and
//!   broken target entries become [`CorruptArtifact`]s; only an unreadable
//!   file or an unparsable document is an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - A store is not mutated once shared; inference receives it as
//!   `Arc<ModelStore>`. Retraining builds a new store.
//! - Target names in the document are the canonical registry names.
pub mod artifact;
pub mod errors;
pub mod persist;

pub use self::artifact::{CRATE_VERSION, ModelArtifact, ModelStore};
pub use self::errors::{CorruptArtifact, StoreError, StoreResult, StoreWarning};
pub use self::persist::{LoadedStore, load, save};
