//! Robust control laws

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::{clamp, saturate};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Adaptation rule for one switching gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GainAdaptation {
    pub rate: f64,
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub dead_zone: f64,
    pub leak_rate: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Classical robust term, `-(K sw + kd s)`.
pub(crate) fn classical(k_switch: f64, kd: f64, s: f64, sw: f64) -> f64 {
    -(k_switch * sw + kd * s)
}

/// Adaptive robust term, `-K sw`.
pub(crate) fn adaptive(gain: f64, sw: f64) -> f64 {
    -gain * sw
}

/// Super-twisting robust term and the next value of the integrator.
///
/// `robust = -K1 sqrt(|s|) sw + z` and `z_dot = -K2 sw`, with `z` held
/// within `[-limit, limit]`.
pub(crate) fn super_twisting(
    k1: f64,
    k2: f64,
    s: f64,
    sw: f64,
    integrator: f64,
    dt: f64,
    limit: f64
) -> (f64, f64) {
    let robust = -k1 * s.abs().sqrt() * sw + integrator;
    let (next, _) = saturate(integrator - k2 * sw * dt, limit);

    (robust, next)
}

impl GainAdaptation {

    /// Integrate the gain over one step.
    ///
    /// Outside the dead zone the gain grows at `rate |s|`, inside it decays
    /// towards its initial value. The result is clamped to `[min, max]`.
    pub(crate) fn step(&self, gain: f64, s: f64, dt: f64) -> f64 {
        let gain_dot = if s.abs() > self.dead_zone {
            self.rate * s.abs()
        }
        else {
            -self.leak_rate * (gain - self.initial)
        };

        clamp(&(gain + gain_dot * dt), &self.min, &self.max)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
