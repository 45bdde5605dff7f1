//! Numerical stability module
//!
//! Every matrix inversion in the control core goes through this module. The
//! `AdaptiveRegulariser` adds a diagonal term sized from the condition number
//! of the matrix, and the `MatrixInverter` only ever factorises the
//! regularised result. Structurally singular or non-finite matrices are
//! rejected rather than regularised, so callers can fall back to their
//! degraded path.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod inverter;
mod params;
mod regulariser;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use inverter::*;
pub use params::*;
pub use regulariser::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during regularisation or inversion.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum NumStabError {
    #[error("The matrix contains non-finite elements")]
    NonFinite,

    #[error("The matrix is numerically singular (smallest singular value {sigma_min:e})")]
    Singular {
        sigma_min: f64
    },

    #[error("The regularised matrix could not be inverted")]
    InversionFailed,

    #[error("Invalid regularisation parameters: {0}")]
    InvalidParams(&'static str),
}
