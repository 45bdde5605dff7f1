//! # Sliding mode control library.
//!
//! This library provides the sliding mode control (SMC) law for a double
//! inverted pendulum on a cart, together with the dynamics model and the
//! numerically regularised matrix inversion that the control law depends on.
//!
//! The per-step data flow is:
//!
//! 1. `surface` maps the state error onto the scalar sliding variable `s`.
//! 2. `dynamics` provides the inertia matrix and forcing terms.
//! 3. `equiv_ctrl` combines both (through `num_stab`) into the feed-forward
//!    equivalent control `u_eq`.
//! 4. `switching` produces the bounded robust term and `smc_ctrl` assembles
//!    the total demand.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Parameters of the closed loop executable
pub mod params;

/// State vector layout and helpers
pub mod state_vector;

/// Numerical stability - adaptive regularisation and safe matrix inversion
pub mod num_stab;

/// Dynamics engine - inertia, Coriolis and gravity terms plus integrators
pub mod dynamics;

/// Sliding surfaces
pub mod surface;

/// Switching functions and boundary layer helpers
pub mod switching;

/// Gain validation against per-controller stability bounds
pub mod gain_validator;

/// Model based equivalent control
pub mod equiv_ctrl;

/// Sliding mode controllers - assembles the full control law
pub mod smc_ctrl;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use state_vector::StateVector;
