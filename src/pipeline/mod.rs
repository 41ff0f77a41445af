//! pipeline — one-call analysis of a spectrum with a trained model store.
//!
//! Chains [`profile`](crate::profiling::profile),
//! [`SaxsClassifier::classify`](crate::prediction::SaxsClassifier::classify),
//! [`SaxsRegressor::predict_params`](crate::prediction::SaxsRegressor::predict_params)
//! and [`SaxsFitter::fit_intensity_params`](crate::fitting::SaxsFitter::fit_intensity_params).
pub mod analyze;
pub mod errors;

pub use self::analyze::{SaxsAnalysis, SaxsPipeline};
pub use self::errors::{PipelineError, PipelineResult};
