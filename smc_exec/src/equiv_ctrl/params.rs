//! Parameters structure for the equivalent control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::EquivCtrlError;
use crate::num_stab::RegularisationParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivCtrlParams {
    /// Minimum magnitude of `L M^-1 B` below which the equivalent control is
    /// not computed.
    pub controllability_threshold: f64,

    /// Regularisation of the inertia matrix before inversion.
    pub regularisation: RegularisationParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for EquivCtrlParams {
    fn default() -> Self {
        Self {
            controllability_threshold: 1e-4,
            regularisation: RegularisationParams::default(),
        }
    }
}

impl EquivCtrlParams {
    pub fn validate(&self) -> Result<(), EquivCtrlError> {
        if !(self.controllability_threshold.is_finite() && self.controllability_threshold >= 0.0) {
            return Err(EquivCtrlError::InvalidParams(format!(
                "controllability_threshold must be finite and non-negative, found {}",
                self.controllability_threshold
            )));
        }

        self.regularisation.validate()?;

        Ok(())
    }
}
