//! Parameters structure for the dynamics engine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{DynamicsError, DynamicsVariant};
use crate::num_stab::RegularisationParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Physical and numerical parameters of the double inverted pendulum.
///
/// The defaults describe the reference plant (2.4 kg cart, two 0.23 kg links
/// of 0.36 m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {

    // ---- MASSES ----

    /// Mass of the cart.
    ///
    /// Units: kilograms
    pub cart_mass_kg: f64,

    /// Mass of the first (lower) link.
    ///
    /// Units: kilograms
    pub pend_1_mass_kg: f64,

    /// Mass of the second (upper) link.
    ///
    /// Units: kilograms
    pub pend_2_mass_kg: f64,

    // ---- GEOMETRY ----

    /// Length of the first link, pivot to pivot.
    ///
    /// Units: meters
    pub pend_1_length_m: f64,

    /// Length of the second link.
    ///
    /// Units: meters
    pub pend_2_length_m: f64,

    /// Distance from the first link's pivot to its centre of mass. Defaults
    /// to half the link length.
    ///
    /// Units: meters
    pub pend_1_com_m: Option<f64>,

    /// Distance from the second link's pivot to its centre of mass. Defaults
    /// to half the link length.
    ///
    /// Units: meters
    pub pend_2_com_m: Option<f64>,

    /// Moment of inertia of the first link about its centre of mass.
    /// Defaults to that of a uniform rod, `m L^2 / 12`.
    ///
    /// Units: kilogram meters squared
    pub pend_1_inertia_kgm2: Option<f64>,

    /// Moment of inertia of the second link about its centre of mass.
    ///
    /// Units: kilogram meters squared
    pub pend_2_inertia_kgm2: Option<f64>,

    /// Gravitational acceleration.
    ///
    /// Units: meters/second^2
    pub gravity_ms2: f64,

    // ---- FRICTION ----

    /// Viscous friction coefficient of the cart.
    ///
    /// Units: newton seconds/meter
    pub cart_friction_nsm: f64,

    /// Viscous friction coefficient of the first joint.
    ///
    /// Units: newton meter seconds/radian
    pub joint_1_friction_nmsrad: f64,

    /// Viscous friction coefficient of the second joint.
    ///
    /// Units: newton meter seconds/radian
    pub joint_2_friction_nmsrad: f64,

    // ---- MODEL ----

    /// Which formulation of the equations of motion to use.
    pub variant: DynamicsVariant,

    /// Regularisation used when solving for the accelerations.
    pub regularisation: RegularisationParams,

    /// Enable the inertia matrix cache at construction.
    ///
    /// Threads sharing a cache-enabled engine contend on the cache lock.
    pub enable_cache: bool,
}

/// Physical coefficients derived from the parameters, grouped the way they
/// appear in the equations of motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantCoeffs {
    /// Total translating mass, `m0 + m1 + m2`
    pub total_mass: f64,

    /// First link gravity/coupling moment, `m1 lc1 + m2 L1`
    pub moment_1: f64,

    /// Second link gravity/coupling moment, `m2 lc2`
    pub moment_2: f64,

    /// Link to link coupling, `m2 L1 lc2`
    pub coupling_12: f64,

    /// First link rotational inertia about its pivot including the second
    /// link's mass, `m1 lc1^2 + m2 L1^2 + I1`
    pub inertia_1: f64,

    /// Second link rotational inertia about its pivot, `m2 lc2^2 + I2`
    pub inertia_2: f64,

    /// Gravitational acceleration
    pub gravity: f64,

    /// Viscous friction on `[x, theta_1, theta_2]`
    pub friction: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            cart_mass_kg: 2.4,
            pend_1_mass_kg: 0.23,
            pend_2_mass_kg: 0.23,
            pend_1_length_m: 0.36,
            pend_2_length_m: 0.36,
            pend_1_com_m: None,
            pend_2_com_m: None,
            pend_1_inertia_kgm2: None,
            pend_2_inertia_kgm2: None,
            gravity_ms2: 9.81,
            cart_friction_nsm: 0.2,
            joint_1_friction_nmsrad: 0.005,
            joint_2_friction_nmsrad: 0.004,
            variant: DynamicsVariant::default(),
            regularisation: RegularisationParams::default(),
            enable_cache: false,
        }
    }
}

impl DynamicsParams {

    /// Parameters of the reference plant with all friction removed, useful
    /// for energy conservation checks.
    pub fn frictionless() -> Self {
        Self {
            cart_friction_nsm: 0.0,
            joint_1_friction_nmsrad: 0.0,
            joint_2_friction_nmsrad: 0.0,
            ..Default::default()
        }
    }

    /// Distance from the first pivot to the first link's centre of mass.
    pub fn pend_1_com(&self) -> f64 {
        self.pend_1_com_m.unwrap_or(0.5 * self.pend_1_length_m)
    }

    /// Distance from the second pivot to the second link's centre of mass.
    pub fn pend_2_com(&self) -> f64 {
        self.pend_2_com_m.unwrap_or(0.5 * self.pend_2_length_m)
    }

    /// Inertia of the first link about its centre of mass.
    pub fn pend_1_inertia(&self) -> f64 {
        self.pend_1_inertia_kgm2
            .unwrap_or(self.pend_1_mass_kg * self.pend_1_length_m.powi(2) / 12.0)
    }

    /// Inertia of the second link about its centre of mass.
    pub fn pend_2_inertia(&self) -> f64 {
        self.pend_2_inertia_kgm2
            .unwrap_or(self.pend_2_mass_kg * self.pend_2_length_m.powi(2) / 12.0)
    }

    /// Check that the parameters describe a physical plant.
    pub fn validate(&self) -> Result<(), DynamicsError> {
        let positive = [
            ("cart_mass_kg", self.cart_mass_kg),
            ("pend_1_mass_kg", self.pend_1_mass_kg),
            ("pend_2_mass_kg", self.pend_2_mass_kg),
            ("pend_1_length_m", self.pend_1_length_m),
            ("pend_2_length_m", self.pend_2_length_m),
            ("pend_1_com_m", self.pend_1_com()),
            ("pend_2_com_m", self.pend_2_com()),
        ];
        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(DynamicsError::InvalidParams(format!(
                    "{} must be finite and positive, found {}", name, value
                )));
            }
        }

        let non_negative = [
            ("pend_1_inertia_kgm2", self.pend_1_inertia()),
            ("pend_2_inertia_kgm2", self.pend_2_inertia()),
            ("gravity_ms2", self.gravity_ms2),
            ("cart_friction_nsm", self.cart_friction_nsm),
            ("joint_1_friction_nmsrad", self.joint_1_friction_nmsrad),
            ("joint_2_friction_nmsrad", self.joint_2_friction_nmsrad),
        ];
        for (name, value) in non_negative.iter() {
            if !(value.is_finite() && *value >= 0.0) {
                return Err(DynamicsError::InvalidParams(format!(
                    "{} must be finite and non-negative, found {}", name, value
                )));
            }
        }

        if self.pend_1_com() > self.pend_1_length_m || self.pend_2_com() > self.pend_2_length_m {
            return Err(DynamicsError::InvalidParams(
                "A link's centre of mass cannot lie beyond the end of the link".into()
            ));
        }

        self.regularisation.validate()?;

        Ok(())
    }

    /// Compute the grouped coefficients used by the equations of motion.
    pub fn coeffs(&self) -> PlantCoeffs {
        let m1 = self.pend_1_mass_kg;
        let m2 = self.pend_2_mass_kg;
        let l1 = self.pend_1_length_m;
        let lc1 = self.pend_1_com();
        let lc2 = self.pend_2_com();

        PlantCoeffs {
            total_mass: self.cart_mass_kg + m1 + m2,
            moment_1: m1 * lc1 + m2 * l1,
            moment_2: m2 * lc2,
            coupling_12: m2 * l1 * lc2,
            inertia_1: m1 * lc1.powi(2) + m2 * l1.powi(2) + self.pend_1_inertia(),
            inertia_2: m2 * lc2.powi(2) + self.pend_2_inertia(),
            gravity: self.gravity_ms2,
            friction: [
                self.cart_friction_nsm,
                self.joint_1_friction_nmsrad,
                self.joint_2_friction_nmsrad,
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
