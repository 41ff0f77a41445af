//! Feature schema and the [`FeatureVector`] container.
//!
//! Purpose
//! -------
//! Fix the names and order of every profiling descriptor. The base schema
//! ([`FeatureKey::BASE`]) is produced by [`profile`](crate::profiling::profile)
//! for every spectrum; the detailed keys are produced per population by
//! [`detailed_profile`](crate::profiling::detailed_profile) and appended for
//! the regressors that consume them.
//!
//! Conventions
//! -----------
//! - Serialized names are snake_case and match [`FeatureKey::name`].
//! - Model artifacts record the ordered key list they were trained on, so the
//!   column order seen by an estimator never depends on map iteration.
use crate::populations::{ModelTarget, PopulationKind};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Names of profiling descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    ImaxOverImean,
    ImaxSharpness,
    IFluctuation,
    LogiFluctuation,
    LogiMaxOverStd,
    RFftIcentroid,
    RFftImax,
    FftLowPowerFraction,
    QIcentroid,
    QLogicentroid,
    QAtImax,
    PearsonQ,
    PearsonQ2,
    PearsonExpq,
    PearsonInvexpq,
    PearsonLogqLogi,
    LogiCurvature,
    LowQLogslope,
    HighQLogslope,
    LowOverHighIntensity,
    // spherical_normal
    QFirstMinimum,
    MinimumDepth,
    PorodSlopeResidual,
    // guinier_porod
    GuinierRgEstimate,
    PorodExponent,
    GuinierFitQuality,
}

impl FeatureKey {
    /// The fixed schema returned by `profile`, in column order.
    pub const BASE: [FeatureKey; 20] = [
        FeatureKey::ImaxOverImean,
        FeatureKey::ImaxSharpness,
        FeatureKey::IFluctuation,
        FeatureKey::LogiFluctuation,
        FeatureKey::LogiMaxOverStd,
        FeatureKey::RFftIcentroid,
        FeatureKey::RFftImax,
        FeatureKey::FftLowPowerFraction,
        FeatureKey::QIcentroid,
        FeatureKey::QLogicentroid,
        FeatureKey::QAtImax,
        FeatureKey::PearsonQ,
        FeatureKey::PearsonQ2,
        FeatureKey::PearsonExpq,
        FeatureKey::PearsonInvexpq,
        FeatureKey::PearsonLogqLogi,
        FeatureKey::LogiCurvature,
        FeatureKey::LowQLogslope,
        FeatureKey::HighQLogslope,
        FeatureKey::LowOverHighIntensity,
    ];

    pub const SPHERICAL_NORMAL: [FeatureKey; 3] =
        [FeatureKey::QFirstMinimum, FeatureKey::MinimumDepth, FeatureKey::PorodSlopeResidual];

    pub const GUINIER_POROD: [FeatureKey; 3] =
        [FeatureKey::GuinierRgEstimate, FeatureKey::PorodExponent, FeatureKey::GuinierFitQuality];

    /// Every key, base first.
    pub fn all() -> impl Iterator<Item = FeatureKey> {
        Self::BASE.into_iter().chain(Self::SPHERICAL_NORMAL).chain(Self::GUINIER_POROD)
    }

    /// Detailed keys produced for `population`; empty for populations
    /// without a detailed profile.
    pub fn detailed(population: PopulationKind) -> &'static [FeatureKey] {
        match population {
            PopulationKind::SphericalNormal => &Self::SPHERICAL_NORMAL,
            PopulationKind::GuinierPorod => &Self::GUINIER_POROD,
            PopulationKind::Unidentified | PopulationKind::DiffractionPeaks => &[],
        }
    }

    /// Input layout of a model target: the base features, followed by the
    /// detailed features of the population named by
    /// [`ModelTarget::detailed_profile`].
    pub fn for_target(target: ModelTarget) -> Vec<FeatureKey> {
        let detailed = target.detailed_profile().map(Self::detailed).unwrap_or(&[]);
        Self::BASE.iter().chain(detailed).copied().collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureKey::ImaxOverImean => "imax_over_imean",
            FeatureKey::ImaxSharpness => "imax_sharpness",
            FeatureKey::IFluctuation => "i_fluctuation",
            FeatureKey::LogiFluctuation => "logi_fluctuation",
            FeatureKey::LogiMaxOverStd => "logi_max_over_std",
            FeatureKey::RFftIcentroid => "r_fft_icentroid",
            FeatureKey::RFftImax => "r_fft_imax",
            FeatureKey::FftLowPowerFraction => "fft_low_power_fraction",
            FeatureKey::QIcentroid => "q_icentroid",
            FeatureKey::QLogicentroid => "q_logicentroid",
            FeatureKey::QAtImax => "q_at_imax",
            FeatureKey::PearsonQ => "pearson_q",
            FeatureKey::PearsonQ2 => "pearson_q2",
            FeatureKey::PearsonExpq => "pearson_expq",
            FeatureKey::PearsonInvexpq => "pearson_invexpq",
            FeatureKey::PearsonLogqLogi => "pearson_logq_logi",
            FeatureKey::LogiCurvature => "logi_curvature",
            FeatureKey::LowQLogslope => "low_q_logslope",
            FeatureKey::HighQLogslope => "high_q_logslope",
            FeatureKey::LowOverHighIntensity => "low_over_high_intensity",
            FeatureKey::QFirstMinimum => "q_first_minimum",
            FeatureKey::MinimumDepth => "minimum_depth",
            FeatureKey::PorodSlopeResidual => "porod_slope_residual",
            FeatureKey::GuinierRgEstimate => "guinier_rg_estimate",
            FeatureKey::PorodExponent => "porod_exponent",
            FeatureKey::GuinierFitQuality => "guinier_fit_quality",
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureKey {
    type Err = crate::populations::UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureKey::all().find(|k| k.name() == s).ok_or_else(|| {
            crate::populations::UnknownKeyError { kind: "feature", name: s.to_string() }
        })
    }
}

/// Ordered map of descriptor values.
///
/// A vector built by `profile` holds exactly [`FeatureKey::BASE`]; detailed
/// values are added with [`FeatureVector::extend`]. Training records may hold
/// a partial vector when their source table has null cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    values: BTreeMap<FeatureKey, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: FeatureKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn insert(&mut self, key: FeatureKey, value: f64) {
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: FeatureKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    /// Add every entry of `other`, overwriting duplicates.
    pub fn extend(&mut self, other: &FeatureVector) {
        for (k, v) in other.iter() {
            self.values.insert(k, v);
        }
    }

    /// True when every key of `keys` is present.
    pub fn has_all(&self, keys: &[FeatureKey]) -> bool {
        keys.iter().all(|k| self.values.contains_key(k))
    }

    /// Values of `keys` in the given order, or the first missing key.
    pub fn select(&self, keys: &[FeatureKey]) -> Result<Array1<f64>, FeatureKey> {
        keys.iter().map(|&k| self.get(k).ok_or(k)).collect::<Result<Vec<_>, _>>().map(Array1::from)
    }
}

impl FromIterator<(FeatureKey, f64)> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = (FeatureKey, f64)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
