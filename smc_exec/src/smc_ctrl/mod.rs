//! # Sliding mode controller module
//!
//! Assembles the full control law for one control step:
//!
//! 1. Evaluate the sliding variable `s` on the error from the target state.
//! 2. Compute the equivalent control `u_eq` from the internal model.
//! 3. Compute the robust term from the switching function, with the gains
//!    of the selected controller (classical, adaptive, super-twisting or
//!    hybrid adaptive super-twisting).
//! 4. Saturate `u = u_eq + robust` to the actuator limit.
//!
//! The controller itself holds only immutable configuration. Everything that
//! evolves between steps (adapted gains, the super-twisting integrator) lives
//! in a `ControllerMemory` value which `compute_control` takes and returns,
//! so one controller can be evaluated for many independent trajectories.
//! `SmcModule` wraps the controller and threads its own memory for use as a
//! cyclic module.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod ctrl;
mod laws;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use ctrl::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::{
    dynamics::DynamicsError,
    equiv_ctrl::EquivCtrlError,
    surface::SurfaceError,
    switching::SwitchingError,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur in the sliding mode controller.
#[derive(Debug, thiserror::Error)]
pub enum SmcCtrlError {
    #[error("Invalid controller parameters: {0}")]
    InvalidParams(String),

    #[error("Gains rejected by validation: {0}")]
    InvalidGains(String),

    #[error("Gains fail the stability conditions: {0}")]
    UnstableGains(String),

    #[error("Controller model error: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("Equivalent control error: {0}")]
    EquivCtrl(#[from] EquivCtrlError),

    #[error("Sliding surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Switching error: {0}")]
    Switching(#[from] SwitchingError),

    #[error("The controller has not been initialised")]
    NotInitialised,
}
