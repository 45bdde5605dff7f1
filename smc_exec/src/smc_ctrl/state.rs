//! Cyclic module wrapper around the sliding mode controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use serde::Serialize;
use thiserror::Error;

// Internal
use super::{ControlDiagnostics, ControllerMemory, SmcCtrl, SmcCtrlError, SmcParams};
use crate::state_vector::StateVector;
use util::{module::CyclicModule, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sliding mode control module state.
///
/// Owns the controller memory and threads it from one `proc` call to the
/// next.
#[derive(Debug, Default)]
pub struct SmcModule {
    ctrl: Option<SmcCtrl>,
    memory: Option<ControllerMemory>,
}

/// Input data to the sliding mode controller.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Current measured plant state.
    pub state: StateVector,
}

/// Output command of the sliding mode controller.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutputData {
    /// Force demand on the cart.
    ///
    /// Units: newtons
    pub force_n: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Could not build the controller: {0}")]
    CtrlError(SmcCtrlError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for InputData {
    fn default() -> Self {
        Self {
            state: StateVector::zeros(),
        }
    }
}

impl SmcModule {

    /// Create the module from an already built controller.
    pub fn from_ctrl(ctrl: SmcCtrl) -> Self {
        Self {
            memory: Some(ctrl.initial_memory()),
            ctrl: Some(ctrl),
        }
    }

    pub fn ctrl(&self) -> Option<&SmcCtrl> {
        self.ctrl.as_ref()
    }

    pub fn memory(&self) -> Option<&ControllerMemory> {
        self.memory.as_ref()
    }
}

impl CyclicModule for SmcModule {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = ControlDiagnostics;
    type ProcError = SmcCtrlError;

    /// Initialise the controller.
    ///
    /// Expected init data is the path to the parameter file. The resolved
    /// parameters, defaults included, are saved into the session.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session
    ) -> Result<(), Self::InitError> {
        let params: SmcParams = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e))
        };

        let ctrl = match SmcCtrl::new(params.clone()) {
            Ok(c) => c,
            Err(e) => return Err(InitError::CtrlError(e))
        };

        info!("Initialised {} from {}", ctrl.kind(), init_data);
        session.save("smc_ctrl/params.json", params);

        *self = Self::from_ctrl(ctrl);

        Ok(())
    }

    /// Compute one control step from the measured state.
    fn proc(
        &mut self,
        input_data: &Self::InputData
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let ctrl = self.ctrl.as_ref().ok_or(SmcCtrlError::NotInitialised)?;
        let memory = match self.memory {
            Some(m) => m,
            None => ctrl.initial_memory()
        };

        let (force_n, next, report) = ctrl.compute_control(&input_data.state, &memory)?;
        self.memory = Some(next);

        trace!("SmcCtrl output: {:.4} N, s = {:.4}", force_n, report.sliding_variable);

        Ok((OutputData { force_n }, report))
    }

    /// Start a new trajectory, discarding adapted gains and integrators.
    fn reset(&mut self) {
        self.memory = self.ctrl.as_ref().map(|c| c.initial_memory());
    }

    fn is_initialised(&self) -> bool {
        self.ctrl.is_some()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
