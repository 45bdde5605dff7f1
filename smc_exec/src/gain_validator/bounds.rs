//! Per-controller gain bound tables

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::SmcKind;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Inclusive allowed range for one named gain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainBound {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const fn bound(name: &'static str, min: f64, max: f64) -> GainBound {
    GainBound { name, min, max }
}

/// Classical SMC, `[k1, k2, lambda_1, lambda_2, K, kd]`.
pub const CLASSICAL_BOUNDS: [GainBound; 6] = [
    bound("k1", 0.1, 1000.0),
    bound("k2", 0.1, 1000.0),
    bound("lambda_1", 0.1, 1000.0),
    bound("lambda_2", 0.1, 1000.0),
    bound("K", 0.1, 1000.0),
    bound("kd", 0.0, 1000.0),
];

/// Adaptive SMC, `[k1, k2, lambda_1, lambda_2, gamma]`.
pub const ADAPTIVE_BOUNDS: [GainBound; 5] = [
    bound("k1", 0.1, 1000.0),
    bound("k2", 0.1, 1000.0),
    bound("lambda_1", 0.1, 1000.0),
    bound("lambda_2", 0.1, 1000.0),
    bound("gamma", 0.01, 10.0),
];

/// Super-twisting SMC, `[K1, K2, k1, k2, lambda_1, lambda_2]`.
pub const SUPER_TWISTING_BOUNDS: [GainBound; 6] = [
    bound("K1", 1.0, 1000.0),
    bound("K2", 1.0, 1000.0),
    bound("k1", 0.1, 1000.0),
    bound("k2", 0.1, 1000.0),
    bound("lambda_1", 0.1, 1000.0),
    bound("lambda_2", 0.1, 1000.0),
];

/// Hybrid adaptive super-twisting SMC, `[c1, lambda_1, c2, lambda_2]`.
pub const HYBRID_BOUNDS: [GainBound; 4] = [
    bound("c1", 0.1, 1000.0),
    bound("lambda_1", 0.1, 1000.0),
    bound("c2", 0.1, 1000.0),
    bound("lambda_2", 0.1, 1000.0),
];

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GainBound {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl SmcKind {

    /// The bound table for this controller, in gain vector order.
    pub fn bounds(&self) -> &'static [GainBound] {
        match self {
            SmcKind::Classical => &CLASSICAL_BOUNDS,
            SmcKind::Adaptive => &ADAPTIVE_BOUNDS,
            SmcKind::SuperTwisting => &SUPER_TWISTING_BOUNDS,
            SmcKind::Hybrid => &HYBRID_BOUNDS,
        }
    }

    /// Number of gains this controller expects.
    pub fn num_gains(&self) -> usize {
        self.bounds().len()
    }

    /// Name of the gain at the given index.
    pub fn gain_name(&self, index: usize) -> Option<&'static str> {
        self.bounds().get(index).map(|b| b.name)
    }
}
