//! # Sliding Mode Control Executable
//!
//! Runs the sliding mode controller in closed loop against a simulated double
//! inverted pendulum on a cart, and saves the resulting trajectory into the
//! session directory.
//!
//! The controller is configured by `params/smc_ctrl.toml`, the simulated
//! plant by `params/dip_dynamics.toml` and the run itself by
//! `params/smc_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, warn};
use serde::Serialize;

use smc_lib::{
    dynamics::{DynamicsEngine, DynamicsParams},
    params::{Integrator, SmcExecParams},
    smc_ctrl::{ControlDiagnostics, InputData, SmcModule},
    state_vector::NUM_STATES,
    StateVector,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::CyclicModule,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// One recorded point of the trajectory.
#[derive(Debug, Clone, Serialize)]
struct Sample {
    time_s: f64,
    state: [f64; NUM_STATES],
    force_n: f64,
    diagnostics: ControlDiagnostics,
}

/// Everything saved at the end of a run.
#[derive(Debug, Clone, Serialize)]
struct Trajectory {
    /// True if the run was stopped because a link fell over.
    aborted: bool,
    num_steps: usize,
    num_saturated_steps: usize,
    initial_energy_j: f64,
    final_energy_j: f64,
    samples: Vec<Sample>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new("smc_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Sliding Mode Control Executable\n");
    info!("Running on: {}", host::get_platform());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: SmcExecParams =
        util::params::load("smc_exec.toml").wrap_err("Could not load exec params")?;

    let plant_params: DynamicsParams =
        util::params::load("dip_dynamics.toml").wrap_err("Could not load plant params")?;

    info!("Exec and plant parameters loaded");

    // ---- INITIALISE MODULES ----

    let mut smc = SmcModule::default();
    smc.init("smc_ctrl.toml", &session)
        .wrap_err("Failed to initialise SmcCtrl")?;
    info!("SmcCtrl init complete");

    let plant = DynamicsEngine::new(plant_params).wrap_err("Failed to build the plant model")?;
    info!("Plant model ({:?}) init complete", plant.variant());

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    let dt = smc
        .ctrl()
        .map(|c| c.params().control_period_s)
        .unwrap_or(0.001);
    let num_steps = (exec_params.duration_s / dt).round() as usize;
    let sample_every = ((exec_params.sample_period_s / dt).round() as usize).max(1);

    let mut state = StateVector::from_column_slice(&exec_params.initial_state);
    let initial_energy_j = plant.total_energy(&state);

    let mut samples = Vec::with_capacity(num_steps / sample_every + 1);
    let mut num_saturated_steps = 0;
    let mut aborted = false;
    let mut step = 0;

    info!(
        "Running {} steps of {} s with the {:?} integrator",
        num_steps, dt, exec_params.integrator
    );

    while step < num_steps {
        let time_s = step as f64 * dt;

        // ---- CONTROL ----

        let (output, diagnostics) = smc
            .proc(&InputData { state })
            .wrap_err("Error during SmcCtrl processing")?;

        if diagnostics.saturated {
            num_saturated_steps += 1;
        }

        if step % sample_every == 0 {
            debug!(
                "t = {:.3} s: s = {:.4}, u = {:.3} N",
                time_s, diagnostics.sliding_variable, output.force_n
            );

            samples.push(Sample {
                time_s,
                state: state.into(),
                force_n: output.force_n,
                diagnostics,
            });
        }

        // ---- PLANT ----

        state = match exec_params.integrator {
            Integrator::Euler => plant.step_euler(&state, output.force_n, dt),
            Integrator::Rk4 => plant.step_rk4(&state, output.force_n, dt),
        }
        .wrap_err("Failed to propagate the plant")?;

        step += 1;

        if state[2].abs() > exec_params.max_abs_angle_rad
            || state[4].abs() > exec_params.max_abs_angle_rad
        {
            warn!(
                "Pendulum fell at t = {:.3} s (theta_1 = {:.3}, theta_2 = {:.3}), stopping",
                step as f64 * dt,
                state[2],
                state[4]
            );
            aborted = true;
            break;
        }
    }

    // ---- SUMMARY ----

    let final_energy_j = plant.total_energy(&state);

    info!("Run complete after {} steps", step);
    info!("Final state: {:?}", state.as_slice());
    info!(
        "Energy: {:.4} J -> {:.4} J, {} saturated steps",
        initial_energy_j, final_energy_j, num_saturated_steps
    );
    if let Some(ctrl) = smc.ctrl() {
        if let Ok(s) = ctrl.sliding_variable(&state) {
            info!("Final sliding variable: {:.5}", s);
        }
    }
    debug!("Plant cache: {:?}", plant.cache_stats());

    session.save(
        "trajectory.json",
        Trajectory {
            aborted,
            num_steps: step,
            num_saturated_steps,
            initial_energy_j,
            final_energy_j,
            samples,
        },
    );

    session.exit();

    Ok(())
}
