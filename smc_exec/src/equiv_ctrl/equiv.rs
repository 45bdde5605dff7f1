//! Equivalent control computation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::{DynamicsModel, EquivCtrlError, EquivCtrlParams};
use crate::dynamics::CONTROL_INPUT;
use crate::num_stab::{condition_number, MatrixInverter, NumStabError};
use crate::state_vector::{self, StateVector};
use crate::surface::SlidingSurface;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Model based equivalent control.
///
/// Without an attached model every computation returns zero.
#[derive(Debug, Clone)]
pub struct EquivalentControl<D> {
    model: Option<D>,
    inverter: MatrixInverter,
    params: EquivCtrlParams,
}

/// How much authority the control input has over the sliding variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllabilityResult {
    /// True if `|L M^-1 B|` reaches the threshold and the inertia matrix
    /// could be inverted.
    pub controllable: bool,

    /// The controllability measure `L M^-1 B`.
    pub lm_inv_b: f64,

    /// Condition number of the unregularised inertia matrix, NaN if no
    /// matrix was available.
    pub condition_number: f64,

    /// True only if the inertia matrix was rejected as singular. A missing
    /// or failing model is not rank deficient, just uncontrollable.
    pub rank_deficient: bool,
}

/// Snapshot of the model terms used by the equivalent control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DynamicsInfo {
    pub mass_matrix: Matrix3<f64>,
    pub forcing: Vector3<f64>,
    pub condition_number: f64,
    pub determinant: f64,

    /// Diagonal term the inverter would add, `None` if the matrix cannot be
    /// inverted.
    pub regularisation: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: DynamicsModel> EquivalentControl<D> {

    /// Create a new equivalent control, optionally attached to a model.
    pub fn new(model: Option<D>, params: EquivCtrlParams) -> Result<Self, EquivCtrlError> {
        params.validate()?;

        Ok(Self {
            model,
            inverter: MatrixInverter::new(params.regularisation)?,
            params,
        })
    }

    /// Create a new equivalent control attached to the given model.
    pub fn with_model(model: D, params: EquivCtrlParams) -> Result<Self, EquivCtrlError> {
        Self::new(Some(model), params)
    }

    pub fn params(&self) -> &EquivCtrlParams {
        &self.params
    }

    pub fn model(&self) -> Option<&D> {
        self.model.as_ref()
    }

    /// Attach a model, returning the previous one.
    pub fn set_model(&mut self, model: D) -> Option<D> {
        self.model.replace(model)
    }

    /// Detach the model.
    pub fn take_model(&mut self) -> Option<D> {
        self.model.take()
    }

    /// Compute the equivalent control at the given state.
    ///
    /// Returns `0.0` on every degraded path.
    pub fn compute(&self, state: &StateVector, surface: &SlidingSurface) -> f64 {
        let model = match self.model {
            Some(ref m) => m,
            None => {
                debug!("No dynamics model attached, equivalent control is zero");
                return 0.0
            }
        };

        let (m, f) = match model.mass_and_forcing(state) {
            Ok(mf) => mf,
            Err(e) => {
                warn!("Could not get the dynamics ({}), equivalent control is zero", e);
                return 0.0
            }
        };

        let m_inv = match self.inverter.invert(&m) {
            Ok(inv) => inv,
            Err(e) => {
                warn!("Inertia matrix inversion failed ({}), equivalent control is zero", e);
                return 0.0
            }
        };

        let l = surface.velocity_gradient();
        let b = Vector3::from(CONTROL_INPUT);

        let lm_inv_b = l.dot(&(m_inv * b));
        if !(lm_inv_b.abs() >= self.params.controllability_threshold) {
            debug!(
                "Controllability measure {:e} below threshold {:e}, equivalent control is zero",
                lm_inv_b, self.params.controllability_threshold
            );
            return 0.0
        }

        let drift = -(m_inv * f);
        let q_dot = state_vector::velocities(state);

        let u_eq = -(l.dot(&drift) + surface.position_gradient().dot(&q_dot)) / lm_inv_b;

        if u_eq.is_finite() {
            u_eq
        }
        else {
            warn!("Non-finite equivalent control, using zero");
            0.0
        }
    }

    /// Evaluate how much authority the control has over the surface.
    pub fn check_controllability(
        &self,
        state: &StateVector,
        surface: &SlidingSurface
    ) -> ControllabilityResult {
        let uncontrollable = ControllabilityResult {
            controllable: false,
            lm_inv_b: 0.0,
            condition_number: std::f64::NAN,
            rank_deficient: false,
        };

        let m = match self.model.as_ref().map(|m| m.mass_and_forcing(state)) {
            Some(Ok((m, _))) => m,
            Some(Err(e)) => {
                debug!("No controllability measure, the model failed: {}", e);
                return uncontrollable;
            },
            None => return uncontrollable,
        };

        let cond = condition_number(&m);

        match self.inverter.invert(&m) {
            Ok(m_inv) => {
                let lm_inv_b = surface
                    .velocity_gradient()
                    .dot(&(m_inv * Vector3::from(CONTROL_INPUT)));

                ControllabilityResult {
                    controllable: lm_inv_b.abs() >= self.params.controllability_threshold,
                    lm_inv_b,
                    condition_number: cond,
                    rank_deficient: false,
                }
            },
            Err(e) => ControllabilityResult {
                condition_number: cond,
                rank_deficient: matches!(e, NumStabError::Singular { .. }),
                ..uncontrollable
            },
        }
    }

    /// Get the model terms at the given state, `None` if no model is attached
    /// or the model fails.
    pub fn get_dynamics_info(&self, state: &StateVector) -> Option<DynamicsInfo> {
        let (m, f) = self.model.as_ref()?.mass_and_forcing(state).ok()?;

        let regularisation = self.inverter
            .regulariser()
            .regularise(&m)
            .ok()
            .map(|r| r.regularisation);

        Some(DynamicsInfo {
            mass_matrix: m,
            forcing: f,
            condition_number: condition_number(&m),
            determinant: m.determinant(),
            regularisation,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
