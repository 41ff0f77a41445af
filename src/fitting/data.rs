//! Measured data prepared for the log-intensity objective.
//!
//! Only points with `I > 0` enter the objective. Weights are normalised to
//! sum to one, which makes the objective a weighted mean and leaves it
//! unchanged when every weight is multiplied by the same factor.
use ndarray::{Array1, ArrayView1};

use crate::{
    fitting::errors::{FitError, FitResult},
    profiling::stats::population_std,
    spectrum::Spectrum,
};

/// Smallest model intensity passed to `ln`.
const MIN_MODEL_INTENSITY: f64 = 1e-300;

#[derive(Debug, Clone, PartialEq)]
pub struct FitData {
    q: Array1<f64>,
    intensity: Array1<f64>,
    q_fit: Array1<f64>,
    log_i: Array1<f64>,
    weights: Array1<f64>,
}

impl FitData {
    /// Build the objective data for `spectrum`.
    ///
    /// With `error_weighted`, point `i` gets weight `I_i² / σ_i²`, the
    /// inverse variance of `ln I_i`. `σ_i` comes from `errors` when given,
    /// otherwise `σ_i = √I_i`, so the default weight is `I_i`.
    ///
    /// # Errors
    /// - [`FitError::UncertaintyLengthMismatch`] when `errors` has the wrong length.
    /// - [`FitError::InvalidUncertainty`] for a non-finite or non-positive
    ///   error at a positive-intensity point.
    pub fn new(
        spectrum: &Spectrum, errors: Option<ArrayView1<'_, f64>>, error_weighted: bool,
    ) -> FitResult<Self> {
        if let Some(e) = errors {
            if e.len() != spectrum.len() {
                return Err(FitError::UncertaintyLengthMismatch {
                    expected: spectrum.len(),
                    found: e.len(),
                });
            }
        }
        let mut q_fit = Vec::with_capacity(spectrum.len());
        let mut log_i = Vec::with_capacity(spectrum.len());
        let mut weights = Vec::with_capacity(spectrum.len());
        for (index, (&qv, &iv)) in spectrum.q().iter().zip(spectrum.intensity().iter()).enumerate()
        {
            if iv <= 0.0 {
                continue;
            }
            let w = match (error_weighted, errors) {
                (false, _) => 1.0,
                (true, None) => iv,
                (true, Some(e)) => {
                    let sigma = e[index];
                    if !sigma.is_finite() || sigma <= 0.0 {
                        return Err(FitError::InvalidUncertainty { index, value: sigma });
                    }
                    (iv / sigma).powi(2)
                }
            };
            q_fit.push(qv);
            log_i.push(iv.ln());
            weights.push(w);
        }
        let total: f64 = weights.iter().sum();
        if total > 0.0 && total.is_finite() {
            weights.iter_mut().for_each(|w| *w /= total);
        }
        Ok(Self {
            q: spectrum.q().to_owned(),
            intensity: spectrum.intensity().to_owned(),
            q_fit: Array1::from(q_fit),
            log_i: Array1::from(log_i),
            weights: Array1::from(weights),
        })
    }

    /// Scattering vectors of the points entering the objective.
    pub fn q_fit(&self) -> ArrayView1<'_, f64> {
        self.q_fit.view()
    }

    /// All scattering vectors of the spectrum.
    pub fn q(&self) -> ArrayView1<'_, f64> {
        self.q.view()
    }

    pub fn n_points(&self) -> usize {
        self.q_fit.len()
    }

    /// Weighted mean squared residual `Σ w_i (ln m_i − ln I_i)²` for a model
    /// evaluated on [`FitData::q_fit`].
    pub fn objective(&self, model: &Array1<f64>) -> f64 {
        model
            .iter()
            .zip(self.log_i.iter())
            .zip(self.weights.iter())
            .map(|((&m, &li), &w)| w * (m.max(MIN_MODEL_INTENSITY).ln() - li).powi(2))
            .sum()
    }

    /// `mean(model) / std(I − model)` for a model evaluated on [`FitData::q`].
    pub fn fit_snr(&self, model: &Array1<f64>) -> f64 {
        let residual: Vec<f64> =
            self.intensity.iter().zip(model.iter()).map(|(&i, &m)| i - m).collect();
        let signal = model.mean().unwrap_or(0.0);
        let noise = population_std(&residual);
        if noise > 0.0 { signal / noise } else { f64::INFINITY }
    }
}
