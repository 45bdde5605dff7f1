//! # Sliding surface module
//!
//! The sliding surface maps the six element state onto the scalar sliding
//! variable
//!
//! ```text
//! s = lambda_1 theta_1_dot + k1 theta_1 + lambda_2 theta_2_dot + k2 theta_2
//! ```
//!
//! The cart position and velocity are not weighted. All coefficients must be
//! strictly positive for the surface dynamics to converge.
//!
//! Inputs are slices so that callers holding other containers can use the
//! surface directly. Non-finite state components are treated as zero.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod coeffs;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use nalgebra::Vector3;

// Internal
pub use coeffs::*;
use crate::state_vector::{self, NUM_STATES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sliding surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SlidingSurface {
    /// First order linear surface.
    Linear(SurfaceCoefficients),

    /// Higher order surface of the given order.
    ///
    /// Holds `2 * order` gains. Only the first four shape the computed
    /// surface, the state carries no higher derivatives for the rest.
    HigherOrder {
        order: usize,
        gains: Vec<f64>,
        coeffs: SurfaceCoefficients,
    },
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building or evaluating a surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Invalid gain: {0}")]
    InvalidGain(String),

    #[error("Expected a state of at least {expected} elements, found {found}")]
    InvalidInput {
        expected: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SlidingSurface {

    /// Build a linear surface from `[k1, k2, lambda_1, lambda_2, ...]`.
    ///
    /// Elements beyond the fourth are ignored.
    pub fn linear(gains: &[f64]) -> Result<Self, SurfaceError> {
        Ok(SlidingSurface::Linear(SurfaceCoefficients::from_gains(gains)?))
    }

    /// Build a higher order surface from exactly `2 * order` gains.
    pub fn higher_order(order: usize, gains: &[f64]) -> Result<Self, SurfaceError> {
        if order < 2 {
            return Err(SurfaceError::InvalidGain(format!(
                "a higher order surface needs an order of at least 2, found {}", order
            )));
        }

        if gains.len() != 2 * order {
            return Err(SurfaceError::InvalidGain(format!(
                "an order {} surface needs {} gains, found {}",
                order, 2 * order, gains.len()
            )));
        }

        if let Some((i, g)) = gains.iter().enumerate().find(|(_, g)| !(g.is_finite() && **g > 0.0)) {
            return Err(SurfaceError::InvalidGain(format!(
                "gain {} must be finite and positive, found {}", i, g
            )));
        }

        Ok(SlidingSurface::HigherOrder {
            order,
            gains: gains.to_vec(),
            coeffs: SurfaceCoefficients::from_gains(gains)?,
        })
    }

    /// The coefficients used to evaluate the surface.
    pub fn coefficients(&self) -> &SurfaceCoefficients {
        match self {
            SlidingSurface::Linear(c) => c,
            SlidingSurface::HigherOrder { coeffs, .. } => coeffs,
        }
    }

    /// Every gain the surface was built from.
    pub fn gains(&self) -> Vec<f64> {
        match self {
            SlidingSurface::Linear(c) => c.as_array().to_vec(),
            SlidingSurface::HigherOrder { gains, .. } => gains.clone(),
        }
    }

    /// Evaluate the sliding variable `s` at the given state.
    pub fn compute(&self, state: &[f64]) -> Result<f64, SurfaceError> {
        check_len(state)?;

        Ok(self.coefficients().evaluate(&sanitise(state)))
    }

    /// Evaluate the surface derivative `s_dot` from the state and its time
    /// derivative `state_dot`, both in the state layout.
    ///
    /// As the surface is linear this is the surface evaluated on `state_dot`.
    pub fn compute_derivative(
        &self,
        state: &[f64],
        state_dot: &[f64]
    ) -> Result<f64, SurfaceError> {
        check_len(state)?;
        check_len(state_dot)?;

        Ok(self.coefficients().evaluate(&sanitise(state_dot)))
    }

    /// Gradient of `s` with respect to the generalised velocities,
    /// `[0, lambda_1, lambda_2]`.
    pub fn velocity_gradient(&self) -> Vector3<f64> {
        let c = self.coefficients();
        Vector3::new(0.0, c.lambda_1, c.lambda_2)
    }

    /// Gradient of `s` with respect to the generalised coordinates,
    /// `[0, k1, k2]`.
    pub fn position_gradient(&self) -> Vector3<f64> {
        let c = self.coefficients();
        Vector3::new(0.0, c.k1, c.k2)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_len(state: &[f64]) -> Result<(), SurfaceError> {
    if state.len() < NUM_STATES {
        Err(SurfaceError::InvalidInput {
            expected: NUM_STATES,
            found: state.len(),
        })
    }
    else {
        Ok(())
    }
}

/// Copy the weighted part of the state, zeroing any non-finite component.
fn sanitise(state: &[f64]) -> [f64; 4] {
    let mut joints = [
        state[state_vector::IDX_THETA_1],
        state[state_vector::IDX_THETA_1_DOT],
        state[state_vector::IDX_THETA_2],
        state[state_vector::IDX_THETA_2_DOT],
    ];

    if joints.iter().any(|v| !v.is_finite()) {
        warn!("Non-finite state components treated as zero in the sliding surface: {:?}", joints);
        for v in joints.iter_mut() {
            *v = util::maths::finite_or(*v, 0.0);
        }
    }

    joints
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
