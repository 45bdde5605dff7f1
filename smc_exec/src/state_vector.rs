//! State vector layout
//!
//! The plant state is stored as `[x, x_dot, theta_1, theta_1_dot, theta_2,
//! theta_2_dot]`, i.e. cart position/velocity followed by the two joint
//! angle/velocity pairs. Angles are absolute, measured from the upright
//! vertical, and are never wrapped. A positive angle leans the link towards
//! negative `x`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Vector3, Vector6};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of elements in the state vector.
pub const NUM_STATES: usize = 6;

/// Number of generalised coordinates (cart, link 1, link 2).
pub const NUM_COORDS: usize = 3;

/// Index of the cart position.
pub const IDX_X: usize = 0;
/// Index of the cart velocity.
pub const IDX_X_DOT: usize = 1;
/// Index of the first joint angle.
pub const IDX_THETA_1: usize = 2;
/// Index of the first joint angular velocity.
pub const IDX_THETA_1_DOT: usize = 3;
/// Index of the second joint angle.
pub const IDX_THETA_2: usize = 4;
/// Index of the second joint angular velocity.
pub const IDX_THETA_2_DOT: usize = 5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The plant state vector.
pub type StateVector = Vector6<f64>;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Extract the generalised coordinates `q = [x, theta_1, theta_2]`.
pub fn positions(state: &StateVector) -> Vector3<f64> {
    Vector3::new(state[IDX_X], state[IDX_THETA_1], state[IDX_THETA_2])
}

/// Extract the generalised velocities `q_dot = [x_dot, theta_1_dot, theta_2_dot]`.
pub fn velocities(state: &StateVector) -> Vector3<f64> {
    Vector3::new(state[IDX_X_DOT], state[IDX_THETA_1_DOT], state[IDX_THETA_2_DOT])
}

/// Interleave positions and velocities back into the state layout.
pub fn from_coords(q: &Vector3<f64>, q_dot: &Vector3<f64>) -> StateVector {
    StateVector::new(q[0], q_dot[0], q[1], q_dot[1], q[2], q_dot[2])
}

/// Build a state vector from a slice, returning `None` if the slice holds
/// fewer than `NUM_STATES` elements. Extra elements are ignored.
pub fn from_slice(values: &[f64]) -> Option<StateVector> {
    if values.len() < NUM_STATES {
        return None;
    }

    Some(StateVector::from_column_slice(&values[..NUM_STATES]))
}

/// Return true if every element of the state is finite.
pub fn is_finite(state: &StateVector) -> bool {
    state.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_coords_round_trip() {
        let state = StateVector::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6);

        assert_eq!(positions(&state), Vector3::new(0.1, 0.3, 0.5));
        assert_eq!(velocities(&state), Vector3::new(0.2, 0.4, 0.6));
        assert_eq!(from_coords(&positions(&state), &velocities(&state)), state);
    }

    #[test]
    fn test_from_slice() {
        assert!(from_slice(&[0.0; 5]).is_none());
        assert_eq!(
            from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap(),
            StateVector::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0)
        );
    }
}
