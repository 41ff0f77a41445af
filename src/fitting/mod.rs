//! fitting — intensity fitter for the composite SAXS model.
//!
//! Purpose
//! -------
//! Refine physical parameters against a measured spectrum. Regressors
//! propose shape parameters; this module settles the intensity scales and,
//! on request, the shapes themselves.
//!
//! Key behaviors
//! -------------
//! - [`SaxsFitter`]: general [`SaxsFitter::fit`] with fixed parameters and
//!   custom bounds, and [`SaxsFitter::fit_intensity_params`].
//! - [`estimate_peak_params`]: windowed peak finder for diffraction peaks.
//! - [`FitReport`]: convergence flag, objectives, iterations and fit SNR.
//!
//! Conventions
//! -----------
//! - Objective: `Σ w_i (ln I_model,i − ln I_i)² / Σ w_i` over points with
//!   `I > 0`; error-weighted by default.
//! - Bounds come from [`ParameterKind::limits`](crate::populations::ParameterKind::limits)
//!   unless overridden with [`ParameterBounds`].
//!
//! Testing notes
//! -------------
//! - Unit tests recover known amplitudes on noiseless synthetic spectra and
//!   exercise every error path; the integration tests chain the fitter after
//!   trained regressors.

pub mod data;
pub mod errors;
pub mod fitter;
pub mod layout;
pub mod objective;
pub mod options;
pub mod peaks;
pub mod report;
pub mod seeds;

pub use self::errors::{FitError, FitResult};
pub use self::fitter::{MIN_FIT_POINTS, SaxsFitter, fit_intensity_params};
pub use self::layout::ParameterBounds;
pub use self::options::FitOptions;
pub use self::peaks::{PEAK_WINDOW, estimate_peak_params};
pub use self::report::{FitOutcome, FitReport};
