//! Regularisation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::NumStabError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Configuration of the adaptive regulariser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularisationParams {
    /// Relative regularisation factor. Scaled by the largest singular value
    /// when escalating, or used directly when `use_fixed_regularisation` is
    /// set.
    pub regularisation_alpha: f64,

    /// Smallest diagonal term that is ever added to a matrix.
    pub min_regularisation: f64,

    /// Condition number above which regularisation is escalated.
    pub max_condition_number: f64,

    /// Always add `regularisation_alpha * I` instead of adapting.
    pub use_fixed_regularisation: bool,
}

impl Default for RegularisationParams {
    fn default() -> Self {
        Self {
            regularisation_alpha: 1e-4,
            min_regularisation: 1e-10,
            max_condition_number: 1e14,
            use_fixed_regularisation: false,
        }
    }
}

impl RegularisationParams {
    /// Check that the parameters are usable.
    pub fn validate(&self) -> Result<(), NumStabError> {
        if !(self.regularisation_alpha.is_finite() && self.regularisation_alpha > 0.0) {
            return Err(NumStabError::InvalidParams(
                "regularisation_alpha must be finite and positive",
            ));
        }
        if !(self.min_regularisation.is_finite() && self.min_regularisation >= 0.0) {
            return Err(NumStabError::InvalidParams(
                "min_regularisation must be finite and non-negative",
            ));
        }
        if !(self.max_condition_number > 1.0) {
            return Err(NumStabError::InvalidParams(
                "max_condition_number must be greater than one",
            ));
        }

        Ok(())
    }
}
