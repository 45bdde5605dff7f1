//! Parameters structure for the sliding mode controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::SmcCtrlError;
use crate::{
    dynamics::DynamicsParams,
    equiv_ctrl::EquivCtrlParams,
    gain_validator::SmcKind,
    state_vector::NUM_STATES,
    switching::SwitchingMethod,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the sliding mode controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmcParams {

    // ---- CONTROL LAW ----

    /// Which controller to run.
    pub kind: SmcKind,

    /// The gain vector, whose layout depends on `kind`:
    ///
    /// - Classical: `[k1, k2, lambda_1, lambda_2, K, kd]`
    /// - Adaptive: `[k1, k2, lambda_1, lambda_2, gamma]`
    /// - Super-twisting: `[K1, K2, k1, k2, lambda_1, lambda_2]`
    /// - Hybrid: `[c1, lambda_1, c2, lambda_2]`
    pub gains: Vec<f64>,

    /// Switching function used for the robust term.
    pub switching: SwitchingMethod,

    /// Width of the boundary layer. Zero gives pure sign switching.
    pub boundary_layer: f64,

    /// Rate at which the boundary layer widens with `|s_dot|`. Zero keeps a
    /// constant boundary layer.
    pub boundary_layer_slope: f64,

    /// Set point the sliding variable is evaluated against.
    pub target_state: [f64; NUM_STATES],

    // ---- LIMITS ----

    /// Maximum force magnitude the actuator can apply to the cart.
    ///
    /// Units: newtons
    pub max_force_n: f64,

    /// Period between control steps, used to integrate adapted gains and the
    /// super-twisting integrator.
    ///
    /// Units: seconds
    pub control_period_s: f64,

    // ---- MODEL ----

    /// Enable the model based equivalent control term.
    pub enable_equivalent_control: bool,

    /// Internal model of the plant used by the equivalent control.
    pub model: DynamicsParams,

    pub equiv_ctrl: EquivCtrlParams,

    // ---- ADAPTATION ----

    pub adaptive: AdaptationParams,

    pub hybrid: HybridParams,
}

/// Gain adaptation of the adaptive controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationParams {
    /// Starting value of the adapted switching gain.
    pub initial_gain: f64,

    /// Lower clamp on the adapted gain.
    pub min_gain: f64,

    /// Upper clamp on the adapted gain.
    pub max_gain: f64,

    /// Band `|s| <= dead_zone` inside which the gain stops growing.
    pub dead_zone: f64,

    /// Rate at which the gain returns to `initial_gain` inside the dead
    /// zone.
    ///
    /// Units: 1/second
    pub leak_rate: f64,
}

/// Gain adaptation of the hybrid adaptive super-twisting controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridParams {
    /// Adaptation rate of the proportional twisting gain.
    pub gamma_1: f64,

    /// Adaptation rate of the integral twisting gain.
    pub gamma_2: f64,

    /// Starting values of the adapted twisting gains `[K1, K2]`.
    pub initial_gains: [f64; 2],

    /// Bounds applied to both adapted twisting gains.
    pub min_gain: f64,
    pub max_gain: f64,

    pub dead_zone: f64,

    /// Units: 1/second
    pub leak_rate: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SmcParams {
    fn default() -> Self {
        Self {
            kind: SmcKind::Classical,
            gains: vec![5.0, 3.0, 10.0, 8.0, 20.0, 1.0],
            switching: SwitchingMethod::Tanh,
            boundary_layer: 0.02,
            boundary_layer_slope: 0.0,
            target_state: [0.0; NUM_STATES],
            max_force_n: 150.0,
            control_period_s: 0.001,
            enable_equivalent_control: true,
            model: DynamicsParams::default(),
            equiv_ctrl: EquivCtrlParams::default(),
            adaptive: AdaptationParams::default(),
            hybrid: HybridParams::default(),
        }
    }
}

impl Default for AdaptationParams {
    fn default() -> Self {
        Self {
            initial_gain: 10.0,
            min_gain: 0.1,
            max_gain: 100.0,
            dead_zone: 0.01,
            leak_rate: 0.1,
        }
    }
}

impl Default for HybridParams {
    fn default() -> Self {
        Self {
            gamma_1: 2.0,
            gamma_2: 0.5,
            initial_gains: [10.0, 5.0],
            min_gain: 0.1,
            max_gain: 100.0,
            dead_zone: 0.01,
            leak_rate: 0.1,
        }
    }
}

impl SmcParams {

    /// Check the non-gain parameters. Gains are checked by the gain
    /// validator when the controller is built.
    pub fn validate(&self) -> Result<(), SmcCtrlError> {
        if !(self.boundary_layer.is_finite() && self.boundary_layer >= 0.0) {
            return Err(invalid("boundary_layer", "finite and non-negative", self.boundary_layer));
        }
        if !(self.boundary_layer_slope.is_finite() && self.boundary_layer_slope >= 0.0) {
            return Err(invalid(
                "boundary_layer_slope", "finite and non-negative", self.boundary_layer_slope
            ));
        }
        if !(self.max_force_n.is_finite() && self.max_force_n > 0.0) {
            return Err(invalid("max_force_n", "finite and positive", self.max_force_n));
        }
        if !(self.control_period_s.is_finite() && self.control_period_s > 0.0) {
            return Err(invalid("control_period_s", "finite and positive", self.control_period_s));
        }
        if self.target_state.iter().any(|v| !v.is_finite()) {
            return Err(SmcCtrlError::InvalidParams(
                "target_state must only contain finite values".into()
            ));
        }

        check_adaptation(
            "adaptive",
            &[self.adaptive.initial_gain],
            self.adaptive.min_gain,
            self.adaptive.max_gain,
            self.adaptive.dead_zone,
            self.adaptive.leak_rate,
        )?;
        check_adaptation(
            "hybrid",
            &self.hybrid.initial_gains,
            self.hybrid.min_gain,
            self.hybrid.max_gain,
            self.hybrid.dead_zone,
            self.hybrid.leak_rate,
        )?;
        if !(self.hybrid.gamma_1 >= 0.0 && self.hybrid.gamma_2 >= 0.0) {
            return Err(SmcCtrlError::InvalidParams(
                "hybrid adaptation rates must be non-negative".into()
            ));
        }

        self.model.validate()?;
        self.equiv_ctrl.validate()?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn invalid(name: &str, requirement: &str, value: f64) -> SmcCtrlError {
    SmcCtrlError::InvalidParams(format!("{} must be {}, found {}", name, requirement, value))
}

fn check_adaptation(
    name: &str,
    initial: &[f64],
    min: f64,
    max: f64,
    dead_zone: f64,
    leak_rate: f64
) -> Result<(), SmcCtrlError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
        return Err(SmcCtrlError::InvalidParams(format!(
            "{} gain bounds must satisfy 0 < min_gain <= max_gain, found [{}, {}]",
            name, min, max
        )));
    }
    if let Some(g) = initial.iter().find(|g| !(**g >= min && **g <= max)) {
        return Err(SmcCtrlError::InvalidParams(format!(
            "{} initial gain {} lies outside [{}, {}]", name, g, min, max
        )));
    }
    if !(dead_zone.is_finite() && dead_zone >= 0.0) {
        return Err(invalid("dead_zone", "finite and non-negative", dead_zone));
    }
    if !(leak_rate.is_finite() && leak_rate >= 0.0) {
        return Err(invalid("leak_rate", "finite and non-negative", leak_rate));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
