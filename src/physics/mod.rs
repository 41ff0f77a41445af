//! physics — analytic SAXS intensity models.
//!
//! See [`intensity`] for the individual population models and the composite
//! [`compute_saxs`].

pub mod intensity;

pub use self::intensity::{
    compute_saxs, guinier_porod, lorentzian_peak, population_intensity, sphere_form_factor,
    spherical_normal,
};
