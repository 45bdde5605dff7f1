//! # SMC Executable Parameters
//!
//! This module provides parameters for the closed loop demonstration
//! executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::state_vector::NUM_STATES;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmcExecParams {

    /// Length of the simulated trajectory.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Plant state at the start of the trajectory.
    pub initial_state: [f64; NUM_STATES],

    /// Integrator used to propagate the plant.
    pub integrator: Integrator,

    /// Period at which trajectory samples are recorded.
    ///
    /// Units: seconds
    pub sample_period_s: f64,

    /// Abort the trajectory once either link leans further than this from
    /// the upright.
    ///
    /// Units: radians
    pub max_abs_angle_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    Euler,
    Rk4,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for SmcExecParams {
    fn default() -> Self {
        Self {
            duration_s: 2.0,
            initial_state: [0.0, 0.0, 0.1, 0.0, 0.05, 0.0],
            integrator: Integrator::Rk4,
            sample_period_s: 0.01,
            max_abs_angle_rad: 1.5,
        }
    }
}
