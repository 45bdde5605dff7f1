//! # Equivalent control module
//!
//! The equivalent control is the model based feed-forward term which would
//! hold the plant on the sliding surface if the model were exact. With the
//! surface gradients `L = [0, lambda_1, lambda_2]` and
//! `Lambda = [0, k1, k2]`, the control direction `B = [1, 0, 0]` and the
//! drift acceleration `a = -M^-1 F`:
//!
//! ```text
//! c    = L M^-1 B
//! u_eq = -(L a + Lambda q_dot) / c
//! ```
//!
//! The term is advisory. Any failure on the way (no model, model error,
//! singular inertia, poor controllability, non-finite result) degrades to
//! `u_eq = 0` with a log message, leaving the switching term to stabilise
//! the plant.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod equiv;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};

// Internal
pub use equiv::*;
pub use params::*;

use crate::dynamics::{DynamicsEngine, DynamicsError};
use crate::num_stab::NumStabError;
use crate::state_vector::{self, StateVector};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A plant model able to provide its inertia matrix and forcing term.
pub trait DynamicsModel {
    /// Compute `(M, F)` at the given state, with `F = C q_dot + G`.
    fn mass_and_forcing(
        &self,
        state: &StateVector
    ) -> Result<(Matrix3<f64>, Vector3<f64>), DynamicsError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors when building an equivalent controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EquivCtrlError {
    #[error("Invalid equivalent control parameters: {0}")]
    InvalidParams(String),

    #[error("Numerical stability error: {0}")]
    NumStab(#[from] NumStabError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DynamicsModel for DynamicsEngine {
    fn mass_and_forcing(
        &self,
        state: &StateVector
    ) -> Result<(Matrix3<f64>, Vector3<f64>), DynamicsError> {
        if !state_vector::is_finite(state) {
            return Err(DynamicsError::InvalidInput(
                "state contains non-finite elements".into()
            ));
        }

        Ok(DynamicsEngine::mass_and_forcing(self, state))
    }
}

impl<D: DynamicsModel + ?Sized> DynamicsModel for &D {
    fn mass_and_forcing(
        &self,
        state: &StateVector
    ) -> Result<(Matrix3<f64>, Vector3<f64>), DynamicsError> {
        (**self).mass_and_forcing(state)
    }
}
