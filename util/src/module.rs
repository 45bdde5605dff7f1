//! Cyclic control module interface
//!
//! A control module is configured once from a parameter file and then
//! stepped at a fixed rate by the executable's main loop. Any memory carried
//! between steps (adapted gains, integrators) lives inside the module and is
//! cleared by `reset`.

use crate::session::Session;

/// A module stepped once per control period.
pub trait CyclicModule {
    /// Data needed by `init`, usually the parameter file path.
    type InitData;
    type InitError;

    /// Measurements consumed by one step.
    type InputData;
    /// Command produced by one step.
    type OutputData;
    /// Diagnostics produced alongside the command.
    type StatusReport;
    type ProcError;

    /// Configure the module, discarding any previous configuration and
    /// step memory. The session is available for recording the resolved
    /// configuration.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one control step.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;

    /// Clear the step memory, keeping the configuration.
    fn reset(&mut self);

    fn is_initialised(&self) -> bool;
}
