//! # Dynamics module
//!
//! Rigid body model of a cart carrying two serially linked pendulums. The
//! equations of motion take the manipulator form
//!
//! ```text
//! M(q) q_ddot + C(q, q_dot) q_dot + G(q) = B u
//! ```
//!
//! with `q = [x, theta_1, theta_2]`, the control force `u` acting on the cart
//! only (`B = [1, 0, 0]`), and `C` also carrying the viscous friction terms.
//! The forcing `F = C q_dot + G` is what the equivalent control consumes.
//!
//! Two variants of the model exist:
//!
//! - `Simplified` - link to link coupling reduced (aligned links assumed in
//!   the inertia coupling, link to link Coriolis terms dropped). Cheap enough
//!   for use inside the control law.
//! - `Full` - exact trigonometric coupling, for higher fidelity simulation.
//!
//! Every call is stateless given the state, control and parameters. The only
//! mutable state is the optional inertia matrix cache, which is disabled by
//! default.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cache;
mod engine;
mod matrices;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use cache::*;
pub use engine::*;
pub use matrices::*;
pub use params::*;

use crate::num_stab::NumStabError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which formulation of the dynamics to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicsVariant {
    /// Reduced link to link coupling, for use in the control loop.
    Simplified,

    /// Exact nonlinear coupling.
    Full,
}

impl Default for DynamicsVariant {
    fn default() -> Self {
        DynamicsVariant::Simplified
    }
}

/// Possible errors that can occur in the dynamics engine.
#[derive(Debug, thiserror::Error)]
pub enum DynamicsError {
    #[error("Invalid physical parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("The integration time step must be finite and positive, found {0}")]
    InvalidTimeStep(f64),

    #[error("Numerical stability error: {0}")]
    NumStab(#[from] NumStabError),
}
