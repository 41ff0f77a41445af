//! Tagged registry of scatterer populations, their parameters and the model
//! targets derived from them.
//!
//! Purpose
//! -------
//! Replace string-keyed dispatch with closed enums. Each variant carries its
//! capabilities (owned parameters, regressed parameters, defaults and limits)
//! as methods, so adding a population is a compile-checked change.
//!
//! Conventions
//! -----------
//! - Canonical names (`"spherical_normal"`, `"r0_sphere"`, ...) appear only at
//!   serialization boundaries: model-store keys, record-table headers and the
//!   Python bindings. They round-trip through `name` / `FromStr`.
//! - `ALL` constants list variants in canonical order. Training, evaluation
//!   and persistence iterate in that order.
use std::str::FromStr;

/// Scatterer population types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PopulationKind {
    Unidentified,
    SphericalNormal,
    GuinierPorod,
    DiffractionPeaks,
}

impl PopulationKind {
    pub const ALL: [PopulationKind; 4] = [
        PopulationKind::Unidentified,
        PopulationKind::SphericalNormal,
        PopulationKind::GuinierPorod,
        PopulationKind::DiffractionPeaks,
    ];

    /// Populations that contribute intensity to the composite model.
    pub const SCATTERERS: [PopulationKind; 3] = [
        PopulationKind::SphericalNormal,
        PopulationKind::GuinierPorod,
        PopulationKind::DiffractionPeaks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PopulationKind::Unidentified => "unidentified",
            PopulationKind::SphericalNormal => "spherical_normal",
            PopulationKind::GuinierPorod => "guinier_porod",
            PopulationKind::DiffractionPeaks => "diffraction_peaks",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Parameters that exist in a spectrum model when this population is
    /// flagged. `I0_floor` is global and owned by no population.
    pub fn owned_parameters(self) -> &'static [ParameterKind] {
        match self {
            PopulationKind::Unidentified => &[],
            PopulationKind::SphericalNormal => &[
                ParameterKind::I0Sphere,
                ParameterKind::R0Sphere,
                ParameterKind::SigmaSphere,
            ],
            PopulationKind::GuinierPorod => {
                &[ParameterKind::GGp, ParameterKind::RgGp, ParameterKind::DGp]
            }
            PopulationKind::DiffractionPeaks => &[
                ParameterKind::QPkcenter,
                ParameterKind::IPkcenter,
                ParameterKind::PkHwhm,
            ],
        }
    }

    /// Shape parameters estimated by a regressor for this population.
    pub fn regressed_parameters(self) -> &'static [ParameterKind] {
        match self {
            PopulationKind::SphericalNormal => {
                &[ParameterKind::R0Sphere, ParameterKind::SigmaSphere]
            }
            PopulationKind::GuinierPorod => &[ParameterKind::RgGp],
            PopulationKind::Unidentified | PopulationKind::DiffractionPeaks => &[],
        }
    }
}

impl std::fmt::Display for PopulationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PopulationKind {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PopulationKind::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownKeyError { kind: "population", name: s.to_string() })
    }
}

/// Named physical parameters of the composite scattering model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKind {
    I0Floor,
    GGp,
    RgGp,
    DGp,
    I0Sphere,
    R0Sphere,
    SigmaSphere,
    QPkcenter,
    IPkcenter,
    PkHwhm,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 10] = [
        ParameterKind::I0Floor,
        ParameterKind::GGp,
        ParameterKind::RgGp,
        ParameterKind::DGp,
        ParameterKind::I0Sphere,
        ParameterKind::R0Sphere,
        ParameterKind::SigmaSphere,
        ParameterKind::QPkcenter,
        ParameterKind::IPkcenter,
        ParameterKind::PkHwhm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParameterKind::I0Floor => "I0_floor",
            ParameterKind::GGp => "G_gp",
            ParameterKind::RgGp => "rg_gp",
            ParameterKind::DGp => "D_gp",
            ParameterKind::I0Sphere => "I0_sphere",
            ParameterKind::R0Sphere => "r0_sphere",
            ParameterKind::SigmaSphere => "sigma_sphere",
            ParameterKind::QPkcenter => "q_pkcenter",
            ParameterKind::IPkcenter => "I_pkcenter",
            ParameterKind::PkHwhm => "pk_hwhm",
        }
    }

    /// Owning population, or `None` for the global floor.
    pub fn owner(self) -> Option<PopulationKind> {
        match self {
            ParameterKind::I0Floor => None,
            ParameterKind::GGp | ParameterKind::RgGp | ParameterKind::DGp => {
                Some(PopulationKind::GuinierPorod)
            }
            ParameterKind::I0Sphere | ParameterKind::R0Sphere | ParameterKind::SigmaSphere => {
                Some(PopulationKind::SphericalNormal)
            }
            ParameterKind::QPkcenter | ParameterKind::IPkcenter | ParameterKind::PkHwhm => {
                Some(PopulationKind::DiffractionPeaks)
            }
        }
    }

    /// Default value used to seed a model before any estimate is available.
    pub fn default_value(self) -> f64 {
        match self {
            ParameterKind::I0Floor => 0.0,
            ParameterKind::GGp => 1e-3,
            ParameterKind::RgGp => 10.0,
            ParameterKind::DGp => 4.0,
            ParameterKind::I0Sphere => 1e-3,
            ParameterKind::R0Sphere => 20.0,
            ParameterKind::SigmaSphere => 0.05,
            ParameterKind::QPkcenter => 0.1,
            ParameterKind::IPkcenter => 1.0,
            ParameterKind::PkHwhm => 1e-3,
        }
    }

    /// Physical limits `(lower, upper)`; `None` means unbounded above.
    ///
    /// Intensity-scale parameters carry no upper limit so that the model stays
    /// invariant under a rescaling of the measured intensity.
    pub fn limits(self) -> (f64, Option<f64>) {
        match self {
            ParameterKind::I0Floor => (0.0, None),
            ParameterKind::GGp => (0.0, None),
            ParameterKind::RgGp => (0.1, Some(1000.0)),
            ParameterKind::DGp => (0.0, Some(4.0)),
            ParameterKind::I0Sphere => (0.0, None),
            ParameterKind::R0Sphere => (1.0, Some(1000.0)),
            ParameterKind::SigmaSphere => (0.0, Some(0.5)),
            ParameterKind::QPkcenter => (0.0, Some(1.0)),
            ParameterKind::IPkcenter => (0.0, None),
            ParameterKind::PkHwhm => (1e-6, Some(0.1)),
        }
    }

    /// Clamp `value` into [`ParameterKind::limits`].
    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.limits();
        let v = value.max(lo);
        match hi {
            Some(hi) => v.min(hi),
            None => v,
        }
    }

    /// True for the parameters that scale intensity linearly.
    pub fn is_intensity_scale(self) -> bool {
        matches!(
            self,
            ParameterKind::I0Floor
                | ParameterKind::GGp
                | ParameterKind::I0Sphere
                | ParameterKind::IPkcenter
        )
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterKind {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterKind::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownKeyError { kind: "parameter", name: s.to_string() })
    }
}

/// A trainable model: one binary classifier per population and one regressor
/// per regressed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelTarget {
    Classifier(PopulationKind),
    Regressor(ParameterKind),
}

impl ModelTarget {
    pub const ALL: [ModelTarget; 7] = [
        ModelTarget::Classifier(PopulationKind::Unidentified),
        ModelTarget::Classifier(PopulationKind::SphericalNormal),
        ModelTarget::Classifier(PopulationKind::GuinierPorod),
        ModelTarget::Classifier(PopulationKind::DiffractionPeaks),
        ModelTarget::Regressor(ParameterKind::R0Sphere),
        ModelTarget::Regressor(ParameterKind::SigmaSphere),
        ModelTarget::Regressor(ParameterKind::RgGp),
    ];

    /// Store key: the population name for classifiers and the parameter name
    /// for regressors.
    pub fn name(self) -> &'static str {
        match self {
            ModelTarget::Classifier(p) => p.name(),
            ModelTarget::Regressor(p) => p.name(),
        }
    }

    pub fn is_classifier(self) -> bool {
        matches!(self, ModelTarget::Classifier(_))
    }

    /// Population whose flag gates the rows this target learns from.
    ///
    /// Classifiers other than `unidentified` learn only from identified rows;
    /// regressors learn only from rows where their owner is flagged.
    pub fn gating_population(self) -> Option<PopulationKind> {
        match self {
            ModelTarget::Classifier(PopulationKind::Unidentified) => None,
            ModelTarget::Classifier(_) => Some(PopulationKind::Unidentified),
            ModelTarget::Regressor(p) => p.owner(),
        }
    }

    /// Population whose detailed profile extends the base features, if any.
    pub fn detailed_profile(self) -> Option<PopulationKind> {
        match self {
            ModelTarget::Regressor(ParameterKind::SigmaSphere) => {
                Some(PopulationKind::SphericalNormal)
            }
            ModelTarget::Regressor(ParameterKind::RgGp) => Some(PopulationKind::GuinierPorod),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelTarget {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelTarget::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownKeyError { kind: "model target", name: s.to_string() })
    }
}

/// A canonical name did not match any registry variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeyError {
    pub kind: &'static str,
    pub name: String,
}

impl std::error::Error for UnknownKeyError {}

impl std::fmt::Display for UnknownKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown {} name '{}'", self.kind, self.name)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<UnknownKeyError> for pyo3::PyErr {
    fn from(err: UnknownKeyError) -> pyo3::PyErr {
        pyo3::exceptions::PyKeyError::new_err(err.to_string())
    }
}
