//! Sliding mode controller implementation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;

// Internal
use super::{laws::{self, GainAdaptation}, SmcCtrlError, SmcParams};
use crate::{
    dynamics::DynamicsEngine,
    equiv_ctrl::EquivalentControl,
    gain_validator::{validate_gains, validate_stability_conditions, SmcKind},
    state_vector::StateVector,
    surface::SlidingSurface,
    switching::adaptive_boundary_layer,
};
use util::maths::saturate;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sliding mode controller.
///
/// Immutable once built, see `compute_control` for the per-step interface.
#[derive(Debug, Clone)]
pub struct SmcCtrl {
    params: SmcParams,
    surface: SlidingSurface,
    law: RobustLaw,
    equiv: EquivalentControl<DynamicsEngine>,
}

/// Values carried from one control step to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerMemory {
    /// Adapted switching gain of the adaptive controller, or adapted `K1`
    /// of the hybrid controller.
    pub adapted_gain_1: f64,

    /// Adapted `K2` of the hybrid controller.
    pub adapted_gain_2: f64,

    /// Super-twisting integrator state `z`.
    pub integrator: f64,

    /// Control demand of the previous step.
    ///
    /// Units: newtons
    pub last_control: f64,

    /// Sliding variable of the previous step, used to estimate `s_dot`.
    pub last_sliding_variable: Option<f64>,
}

/// Diagnostics of one control step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlDiagnostics {
    /// The sliding variable `s`.
    pub sliding_variable: f64,

    /// The equivalent control term.
    ///
    /// Units: newtons
    pub equivalent_control: f64,

    /// Output of the switching function.
    pub switching: f64,

    /// The robust control term.
    ///
    /// Units: newtons
    pub robust_control: f64,

    /// True if the demand was limited to the maximum force.
    pub saturated: bool,

    /// Controllability measure `L M^-1 B`, zero if the equivalent control is
    /// disabled or unavailable.
    pub controllability: f64,

    /// Boundary layer width used on this step.
    pub boundary_layer: f64,
}

/// Robust law gains decoded from the gain vector.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RobustLaw {
    Classical {
        k_switch: f64,
        kd: f64,
    },
    Adaptive(GainAdaptation),
    SuperTwisting {
        k1: f64,
        k2: f64,
    },
    Hybrid {
        k1: GainAdaptation,
        k2: GainAdaptation,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SmcCtrl {

    /// Build a controller from parameters, using `params.model` as the
    /// internal model.
    pub fn new(params: SmcParams) -> Result<Self, SmcCtrlError> {
        let model = if params.enable_equivalent_control {
            Some(DynamicsEngine::new(params.model)?)
        }
        else {
            None
        };

        Self::with_model(params, model)
    }

    /// Build a controller with an explicit internal model, or none.
    ///
    /// Fails if the gains are outside their bounds or violate a critical
    /// stability condition.
    pub fn with_model(
        params: SmcParams,
        model: Option<DynamicsEngine>
    ) -> Result<Self, SmcCtrlError> {
        params.validate()?;

        let report = validate_gains(&params.gains, params.kind);
        if !report.valid {
            return Err(SmcCtrlError::InvalidGains(report.summary()));
        }

        let stability = validate_stability_conditions(&params.gains, params.kind);
        if !stability.stable {
            return Err(SmcCtrlError::UnstableGains(stability.critical_summary()));
        }
        for issue in stability.issues.iter() {
            warn!("{} gains: {}", params.kind, issue.description);
        }

        let surface = SlidingSurface::linear(&surface_gains(params.kind, &params.gains))?;
        let law = RobustLaw::from_params(&params);
        let equiv = EquivalentControl::new(model, params.equiv_ctrl)?;

        debug!("Built {} with surface {:?}", params.kind, surface.coefficients());

        Ok(Self {
            params,
            surface,
            law,
            equiv,
        })
    }

    pub fn params(&self) -> &SmcParams {
        &self.params
    }

    pub fn kind(&self) -> SmcKind {
        self.params.kind
    }

    pub fn surface(&self) -> &SlidingSurface {
        &self.surface
    }

    pub fn equivalent_control(&self) -> &EquivalentControl<DynamicsEngine> {
        &self.equiv
    }

    /// Memory at the start of a trajectory.
    pub fn initial_memory(&self) -> ControllerMemory {
        let (adapted_gain_1, adapted_gain_2) = match self.law {
            RobustLaw::Adaptive(a) => (a.initial, 0.0),
            RobustLaw::Hybrid { k1, k2 } => (k1.initial, k2.initial),
            _ => (0.0, 0.0),
        };

        ControllerMemory {
            adapted_gain_1,
            adapted_gain_2,
            integrator: 0.0,
            last_control: 0.0,
            last_sliding_variable: None,
        }
    }

    /// Evaluate the sliding variable on the error from the target state.
    pub fn sliding_variable(&self, state: &StateVector) -> Result<f64, SmcCtrlError> {
        let error = state - StateVector::from(self.params.target_state);

        Ok(self.surface.compute(error.as_slice())?)
    }

    /// Compute one control step.
    ///
    /// Returns the force demand, the memory to pass to the next step and the
    /// diagnostics of this step.
    pub fn compute_control(
        &self,
        state: &StateVector,
        memory: &ControllerMemory
    ) -> Result<(f64, ControllerMemory, ControlDiagnostics), SmcCtrlError> {
        let dt = self.params.control_period_s;
        let max_force = self.params.max_force_n;

        let s = self.sliding_variable(state)?;
        let boundary_layer = self.boundary_layer(s, memory)?;
        let sw = self.params.switching.compute(s, boundary_layer);

        let (u_eq, controllability) = if self.equiv.model().is_some() {
            (
                self.equiv.compute(state, &self.surface),
                self.equiv.check_controllability(state, &self.surface).lm_inv_b,
            )
        }
        else {
            (0.0, 0.0)
        };

        let mut next = ControllerMemory {
            last_sliding_variable: Some(s),
            ..*memory
        };

        let robust = match self.law {
            RobustLaw::Classical { k_switch, kd } => laws::classical(k_switch, kd, s, sw),
            RobustLaw::Adaptive(adaptation) => {
                let robust = laws::adaptive(memory.adapted_gain_1, sw);
                next.adapted_gain_1 = adaptation.step(memory.adapted_gain_1, s, dt);
                robust
            },
            RobustLaw::SuperTwisting { k1, k2 } => {
                let (robust, z) = laws::super_twisting(
                    k1, k2, s, sw, memory.integrator, dt, max_force
                );
                next.integrator = z;
                robust
            },
            RobustLaw::Hybrid { k1, k2 } => {
                let (robust, z) = laws::super_twisting(
                    memory.adapted_gain_1,
                    memory.adapted_gain_2,
                    s, sw, memory.integrator, dt, max_force
                );
                next.integrator = z;
                next.adapted_gain_1 = k1.step(memory.adapted_gain_1, s, dt);
                next.adapted_gain_2 = k2.step(memory.adapted_gain_2, s, dt);
                robust
            },
        };

        let (u, saturated) = saturate(u_eq + robust, max_force);
        let u = if u.is_finite() {
            u
        }
        else {
            warn!("Non-finite control demand, commanding zero force");
            0.0
        };
        next.last_control = u;

        let diags = ControlDiagnostics {
            sliding_variable: s,
            equivalent_control: u_eq,
            switching: sw,
            robust_control: robust,
            saturated,
            controllability,
            boundary_layer,
        };

        Ok((u, next, diags))
    }

    /// Boundary layer for this step, widened by the estimated `|s_dot|` if
    /// enabled.
    fn boundary_layer(&self, s: f64, memory: &ControllerMemory) -> Result<f64, SmcCtrlError> {
        let eps = self.params.boundary_layer;
        let slope = self.params.boundary_layer_slope;

        match memory.last_sliding_variable {
            Some(last) if eps > 0.0 && slope > 0.0 => {
                let s_dot = (s - last) / self.params.control_period_s;
                Ok(adaptive_boundary_layer(s, s_dot, eps, slope)?)
            },
            _ => Ok(eps),
        }
    }
}

impl RobustLaw {
    fn from_params(params: &SmcParams) -> Self {
        let g = &params.gains;

        match params.kind {
            SmcKind::Classical => RobustLaw::Classical {
                k_switch: g[4],
                kd: g[5],
            },
            SmcKind::Adaptive => {
                let a = &params.adaptive;
                RobustLaw::Adaptive(GainAdaptation {
                    rate: g[4],
                    initial: a.initial_gain,
                    min: a.min_gain,
                    max: a.max_gain,
                    dead_zone: a.dead_zone,
                    leak_rate: a.leak_rate,
                })
            },
            SmcKind::SuperTwisting => RobustLaw::SuperTwisting {
                k1: g[0],
                k2: g[1],
            },
            SmcKind::Hybrid => {
                let h = &params.hybrid;
                let adaptation = |rate: f64, initial: f64| GainAdaptation {
                    rate,
                    initial,
                    min: h.min_gain,
                    max: h.max_gain,
                    dead_zone: h.dead_zone,
                    leak_rate: h.leak_rate,
                };
                RobustLaw::Hybrid {
                    k1: adaptation(h.gamma_1, h.initial_gains[0]),
                    k2: adaptation(h.gamma_2, h.initial_gains[1]),
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Extract the surface gains `[k1, k2, lambda_1, lambda_2]` from a gain
/// vector of the given controller.
///
/// The gain vector must already hold the right number of gains.
pub fn surface_gains(kind: SmcKind, gains: &[f64]) -> [f64; 4] {
    match kind {
        SmcKind::Classical | SmcKind::Adaptive => [gains[0], gains[1], gains[2], gains[3]],
        SmcKind::SuperTwisting => [gains[2], gains[3], gains[4], gains[5]],
        SmcKind::Hybrid => [gains[0], gains[2], gains[1], gains[3]],
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::switching::SwitchingMethod;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn params(kind: SmcKind, gains: &[f64]) -> SmcParams {
        SmcParams {
            kind,
            gains: gains.to_vec(),
            ..Default::default()
        }
    }

    fn leaning() -> StateVector {
        StateVector::new(0.0, 0.0, 0.1, 0.0, 0.05, 0.0)
    }

    #[test]
    fn test_rejects_invalid_gains() {
        let p = params(SmcKind::Classical, &[5.0, 3.0, 10.0]);
        assert!(matches!(SmcCtrl::new(p), Err(SmcCtrlError::InvalidGains(_))));

        let p = params(SmcKind::Classical, &[5.0, 3.0, 10.0, 8.0, 20.0, std::f64::NAN]);
        assert!(matches!(SmcCtrl::new(p), Err(SmcCtrlError::InvalidGains(_))));

        let p = params(SmcKind::SuperTwisting, &[4.0, 5.0, 10.0, 5.0, 8.0, 3.0]);
        assert!(matches!(SmcCtrl::new(p), Err(SmcCtrlError::UnstableGains(_))));
    }

    #[test]
    fn test_surface_gain_mapping() {
        assert_eq!(surface_gains(SmcKind::SuperTwisting, &[25.0, 10.0, 5.0, 3.0, 10.0, 8.0]), [5.0, 3.0, 10.0, 8.0]);
        assert_eq!(surface_gains(SmcKind::Hybrid, &[5.0, 10.0, 3.0, 8.0]), [5.0, 3.0, 10.0, 8.0]);
        assert_eq!(surface_gains(SmcKind::Adaptive, &[5.0, 3.0, 10.0, 8.0, 0.5]), [5.0, 3.0, 10.0, 8.0]);
    }

    #[test]
    fn test_upright_target() {
        let mut p = SmcParams::default();
        p.target_state = [0.0, 0.0, PI, 0.0, 0.0, 0.0];
        let ctrl = SmcCtrl::new(p).unwrap();
        let state = StateVector::new(0.0, 0.0, PI, 0.0, 0.0, 0.0);

        let (u, _, diags) = ctrl.compute_control(&state, &ctrl.initial_memory()).unwrap();

        assert_eq!(diags.sliding_variable, 0.0);
        assert!(diags.equivalent_control.abs() < 1e-9);
        assert!(u.abs() < 1e-9);
    }

    #[test]
    fn test_classical_opposes_surface() {
        let ctrl = SmcCtrl::new(SmcParams::default()).unwrap();

        let (u, mem, diags) = ctrl.compute_control(&leaning(), &ctrl.initial_memory()).unwrap();

        assert!(diags.sliding_variable > 0.0);
        assert!(diags.robust_control < 0.0);
        assert!(diags.controllability > 0.0);
        assert_relative_eq!(u, diags.equivalent_control + diags.robust_control);
        assert_eq!(mem.last_control, u);
        assert_eq!(mem.last_sliding_variable, Some(diags.sliding_variable));
    }

    #[test]
    fn test_reaching_phase() {
        let ctrl = SmcCtrl::new(SmcParams::default()).unwrap();
        let plant = DynamicsEngine::new(ctrl.params().model).unwrap();
        let dt = ctrl.params().control_period_s;

        let mut state = leaning();
        let mut memory = ctrl.initial_memory();
        let s0 = ctrl.sliding_variable(&state).unwrap();

        for _ in 0..50 {
            let (u, next, _) = ctrl.compute_control(&state, &memory).unwrap();
            state = plant.step_rk4(&state, u, dt).unwrap();
            memory = next;
        }

        let s1 = ctrl.sliding_variable(&state).unwrap();
        assert!(s1.abs() < 0.5 * s0.abs(), "s went from {} to {}", s0, s1);
    }

    #[test]
    fn test_saturation() {
        let mut p = SmcParams::default();
        p.max_force_n = 1.0;
        let ctrl = SmcCtrl::new(p).unwrap();

        let (u, _, diags) = ctrl.compute_control(&leaning(), &ctrl.initial_memory()).unwrap();

        assert_eq!(u, -1.0);
        assert!(diags.saturated);
    }

    #[test]
    fn test_without_equivalent_control() {
        let mut p = SmcParams::default();
        p.enable_equivalent_control = false;
        let ctrl = SmcCtrl::new(p).unwrap();

        let (u, _, diags) = ctrl.compute_control(&leaning(), &ctrl.initial_memory()).unwrap();

        assert_eq!(diags.equivalent_control, 0.0);
        assert_eq!(diags.controllability, 0.0);
        assert_eq!(u, diags.robust_control);
    }

    #[test]
    fn test_adaptive_gain_grows() {
        let mut p = params(SmcKind::Adaptive, &[5.0, 3.0, 10.0, 8.0, 0.5]);
        p.enable_equivalent_control = false;
        let ctrl = SmcCtrl::new(p).unwrap();
        let memory = ctrl.initial_memory();
        assert_eq!(memory.adapted_gain_1, 10.0);

        let (u, next, diags) = ctrl.compute_control(&leaning(), &memory).unwrap();

        // The current step uses the gain from memory
        assert_relative_eq!(u, -10.0 * diags.switching);
        assert!(next.adapted_gain_1 > memory.adapted_gain_1);
    }

    #[test]
    fn test_super_twisting_integrator() {
        let mut p = params(SmcKind::SuperTwisting, &[25.0, 10.0, 5.0, 3.0, 10.0, 8.0]);
        p.enable_equivalent_control = false;
        let ctrl = SmcCtrl::new(p).unwrap();

        let (_, mem_1, diags) = ctrl.compute_control(&leaning(), &ctrl.initial_memory()).unwrap();
        assert_relative_eq!(mem_1.integrator, -10.0 * diags.switching * 0.001);

        let (_, mem_2, _) = ctrl.compute_control(&leaning(), &mem_1).unwrap();
        assert!(mem_2.integrator < mem_1.integrator);
    }

    #[test]
    fn test_hybrid_adapts_both_gains() {
        let mut p = params(SmcKind::Hybrid, &[5.0, 10.0, 3.0, 8.0]);
        p.enable_equivalent_control = false;
        let ctrl = SmcCtrl::new(p).unwrap();
        let memory = ctrl.initial_memory();
        assert_eq!((memory.adapted_gain_1, memory.adapted_gain_2), (10.0, 5.0));

        let (_, next, _) = ctrl.compute_control(&leaning(), &memory).unwrap();

        assert!(next.adapted_gain_1 > 10.0);
        assert!(next.adapted_gain_2 > 5.0);
        assert!(next.integrator < 0.0);
    }

    #[test]
    fn test_adaptive_boundary_layer() {
        let mut p = SmcParams::default();
        p.boundary_layer_slope = 0.1;
        let ctrl = SmcCtrl::new(p).unwrap();

        let (_, mem, first) = ctrl.compute_control(&leaning(), &ctrl.initial_memory()).unwrap();
        assert_eq!(first.boundary_layer, 0.02);

        let moved = StateVector::new(0.0, 0.0, 0.1, 0.5, 0.05, 0.0);
        let (_, _, second) = ctrl.compute_control(&moved, &mem).unwrap();
        assert!(second.boundary_layer > 0.02);
    }

    #[test]
    fn test_sign_switching() {
        let mut p = SmcParams::default();
        p.switching = SwitchingMethod::Sign;
        p.enable_equivalent_control = false;
        let ctrl = SmcCtrl::new(p).unwrap();

        let (u, _, diags) = ctrl.compute_control(&leaning(), &ctrl.initial_memory()).unwrap();

        assert_eq!(diags.switching, 1.0);
        assert_relative_eq!(u, -(20.0 + diags.sliding_variable));
    }

    #[test]
    fn test_non_finite_state_is_tolerated() {
        let ctrl = SmcCtrl::new(SmcParams::default()).unwrap();
        let state = StateVector::new(0.0, 0.0, std::f64::NAN, 0.0, 0.0, 0.0);

        let (u, _, diags) = ctrl.compute_control(&state, &ctrl.initial_memory()).unwrap();

        assert!(u.is_finite());
        assert_eq!(diags.equivalent_control, 0.0);
    }
}
