//! Adaptive diagonal regularisation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::Matrix3;
use serde::Serialize;

// Internal
use super::{NumStabError, RegularisationParams};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of times the regularisation is multiplied up before giving
/// up on reaching the target condition number.
pub const MAX_ESCALATIONS: usize = 16;

/// Factor applied to the regularisation on each escalation.
const ESCALATION_FACTOR: f64 = 10.0;

/// Dimension of the matrices handled here, used for the numerical rank test.
const DIM: f64 = 3.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Regularises matrices before inversion based on their condition number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveRegulariser {
    params: RegularisationParams,
}

/// The outcome of regularising a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regularised {
    /// The regularised matrix, `M + regularisation * I`.
    pub matrix: Matrix3<f64>,

    /// The diagonal term that was added.
    pub regularisation: f64,

    /// Condition number of the raw matrix.
    pub condition_before: f64,

    /// Condition number of the regularised matrix.
    pub condition_after: f64,

    /// Number of escalation steps taken (zero if the minimum regularisation
    /// was already sufficient).
    pub escalations: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AdaptiveRegulariser {

    /// Create a new regulariser with the given parameters.
    pub fn new(params: RegularisationParams) -> Result<Self, NumStabError> {
        params.validate()?;

        Ok(Self { params })
    }

    /// Get the parameters of the regulariser.
    pub fn params(&self) -> &RegularisationParams {
        &self.params
    }

    /// Regularise the given matrix.
    ///
    /// The returned matrix always carries at least `min_regularisation` on
    /// its diagonal, so a raw matrix is never handed on to an inversion.
    pub fn regularise(&self, matrix: &Matrix3<f64>) -> Result<Regularised, NumStabError> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(NumStabError::NonFinite);
        }

        let (sigma_min, sigma_max) = singular_value_range(matrix);

        // Rank deficient matrices are not repaired, regularisation only
        // improves conditioning of matrices which are actually invertible.
        if sigma_max <= 0.0 || sigma_min <= DIM * std::f64::EPSILON * sigma_max {
            debug!(
                "Rejecting singular matrix (sigma_min = {:e}, sigma_max = {:e})",
                sigma_min, sigma_max
            );
            return Err(NumStabError::Singular { sigma_min });
        }

        let condition_before = sigma_max / sigma_min;

        // Fixed regularisation, no adaptation
        if self.params.use_fixed_regularisation {
            let reg = self.params.regularisation_alpha;
            let regularised = add_diagonal(matrix, reg);

            return Ok(Regularised {
                matrix: regularised,
                regularisation: reg,
                condition_before,
                condition_after: condition_number(&regularised),
                escalations: 0,
            });
        }

        // Always apply the minimum term
        let mut reg = self.params.min_regularisation;
        let mut regularised = add_diagonal(matrix, reg);
        let mut condition_after = condition_number(&regularised);
        let mut escalations = 0;

        if condition_after > self.params.max_condition_number {
            reg = (self.params.regularisation_alpha * sigma_max)
                .max(self.params.min_regularisation);

            loop {
                regularised = add_diagonal(matrix, reg);
                condition_after = condition_number(&regularised);
                escalations += 1;

                trace!(
                    "Regularisation escalation {}: reg = {:e}, cond = {:e}",
                    escalations, reg, condition_after
                );

                if condition_after <= self.params.max_condition_number
                    || escalations >= MAX_ESCALATIONS
                {
                    break;
                }

                reg *= ESCALATION_FACTOR;
            }

            if condition_after > self.params.max_condition_number {
                warn!(
                    "Regularisation could not reach the target condition number \
                    ({:e} > {:e}) after {} escalations",
                    condition_after, self.params.max_condition_number, escalations
                );
            }
            else {
                debug!(
                    "Ill-conditioned matrix regularised: cond {:e} -> {:e} (reg = {:e})",
                    condition_before, condition_after, reg
                );
            }
        }

        Ok(Regularised {
            matrix: regularised,
            regularisation: reg,
            condition_before,
            condition_after,
            escalations,
        })
    }
}

impl Default for AdaptiveRegulariser {
    fn default() -> Self {
        Self {
            params: RegularisationParams::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the 2-norm condition number of a matrix.
///
/// Returns infinity for a singular matrix and NaN if the matrix holds
/// non-finite elements.
pub fn condition_number(matrix: &Matrix3<f64>) -> f64 {
    if matrix.iter().any(|v| !v.is_finite()) {
        return std::f64::NAN;
    }

    let (sigma_min, sigma_max) = singular_value_range(matrix);

    if sigma_min <= 0.0 {
        std::f64::INFINITY
    }
    else {
        sigma_max / sigma_min
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the smallest and largest singular values of the matrix.
fn singular_value_range(matrix: &Matrix3<f64>) -> (f64, f64) {
    let sv = matrix.singular_values();

    (sv.min(), sv.max())
}

fn add_diagonal(matrix: &Matrix3<f64>, value: f64) -> Matrix3<f64> {
    matrix + Matrix3::identity() * value
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
