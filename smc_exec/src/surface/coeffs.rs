//! Sliding surface coefficients

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::SurfaceError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The four shaping coefficients of a linear sliding surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCoefficients {
    /// Weight on the first joint angle.
    pub k1: f64,

    /// Weight on the second joint angle.
    pub k2: f64,

    /// Weight on the first joint angular velocity.
    pub lambda_1: f64,

    /// Weight on the second joint angular velocity.
    pub lambda_2: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SurfaceCoefficients {

    /// Extract the coefficients from the first four gains,
    /// `[k1, k2, lambda_1, lambda_2]`.
    pub fn from_gains(gains: &[f64]) -> Result<Self, SurfaceError> {
        if gains.len() < 4 {
            return Err(SurfaceError::InvalidGain(format!(
                "at least 4 surface gains are required, found {}", gains.len()
            )));
        }

        for (name, value) in ["k1", "k2", "lambda_1", "lambda_2"].iter().zip(gains.iter()) {
            if !(value.is_finite() && *value > 0.0) {
                return Err(SurfaceError::InvalidGain(format!(
                    "{} must be finite and strictly positive, found {}", name, value
                )));
            }
        }

        Ok(Self {
            k1: gains[0],
            k2: gains[1],
            lambda_1: gains[2],
            lambda_2: gains[3],
        })
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.k1, self.k2, self.lambda_1, self.lambda_2]
    }

    /// Evaluate the surface on `[theta_1, theta_1_dot, theta_2, theta_2_dot]`.
    pub(crate) fn evaluate(&self, joints: &[f64; 4]) -> f64 {
        self.lambda_1 * joints[1]
            + self.k1 * joints[0]
            + self.lambda_2 * joints[3]
            + self.k2 * joints[2]
    }
}
