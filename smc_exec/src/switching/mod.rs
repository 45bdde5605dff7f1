//! # Switching function module
//!
//! Switching functions map the sliding variable `s` and the boundary layer
//! width `epsilon` onto a bounded robust term in `[-1, 1]`. The smooth
//! variants replace the discontinuous sign inside the boundary layer to
//! reduce chattering.
//!
//! All variants are odd in `s` and fall back to `sign(s)` when the boundary
//! layer is not strictly positive. A NaN sliding variable gives 0.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod reaching;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use reaching::*;
use util::maths::sign;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Ratios `|s / epsilon|` above this are treated as fully saturated.
pub const SATURATION_RATIO: f64 = 700.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The available switching functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchingMethod {
    /// `tanh(s / epsilon)`
    Tanh,

    /// Saturation, `clip(s / epsilon, -1, 1)`
    Linear,

    /// Discontinuous `sign(s)`, epsilon is ignored
    Sign,

    /// `2 / (1 + exp(-2 s / epsilon)) - 1`
    Sigmoid,
}

/// Possible errors raised by the switching helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwitchingError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SwitchingMethod {
    fn default() -> Self {
        SwitchingMethod::Tanh
    }
}

impl SwitchingMethod {

    /// Evaluate the switching function.
    pub fn compute(&self, s: f64, epsilon: f64) -> f64 {
        if s.is_nan() {
            return 0.0;
        }

        if *self == SwitchingMethod::Sign || !(epsilon > 0.0) {
            return sign(s);
        }

        let ratio = s.abs() / epsilon;

        // Computed on |s| and mirrored so that every variant is exactly odd
        let magnitude = if ratio > SATURATION_RATIO {
            1.0
        }
        else {
            match self {
                SwitchingMethod::Tanh => ratio.tanh(),
                SwitchingMethod::Linear => ratio.min(1.0),
                SwitchingMethod::Sigmoid => 2.0 / (1.0 + (-2.0 * ratio).exp()) - 1.0,
                SwitchingMethod::Sign => 1.0,
            }
        };

        sign(s) * magnitude
    }

    /// Slope of the switching function with respect to `s`.
    ///
    /// The sign function and a non-positive boundary layer give 0.
    pub fn derivative(&self, s: f64, epsilon: f64) -> f64 {
        if s.is_nan() || !(epsilon > 0.0) {
            return 0.0;
        }

        let ratio = s / epsilon;

        match self {
            SwitchingMethod::Sign => 0.0,
            SwitchingMethod::Tanh => {
                if ratio.abs() > SATURATION_RATIO {
                    0.0
                }
                else {
                    (1.0 - ratio.tanh().powi(2)) / epsilon
                }
            },
            SwitchingMethod::Linear => {
                if ratio.abs() <= 1.0 {
                    1.0 / epsilon
                }
                else {
                    0.0
                }
            },
            SwitchingMethod::Sigmoid => {
                // (4/eps) e^x / (1 + e^x)^2 with x = -2s/eps, written with
                // e^-|x| which is symmetric in x and cannot overflow
                let e = (-2.0 * ratio.abs()).exp();
                (4.0 / epsilon) * e / (1.0 + e).powi(2)
            },
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// `tanh(s / epsilon)` switching.
pub fn tanh_switching(s: f64, epsilon: f64) -> f64 {
    SwitchingMethod::Tanh.compute(s, epsilon)
}

/// Saturation switching.
pub fn linear_switching(s: f64, epsilon: f64) -> f64 {
    SwitchingMethod::Linear.compute(s, epsilon)
}

/// Pure sign switching.
pub fn sign_switching(s: f64) -> f64 {
    SwitchingMethod::Sign.compute(s, 0.0)
}

/// Logistic switching.
pub fn sigmoid_switching(s: f64, epsilon: f64) -> f64 {
    SwitchingMethod::Sigmoid.compute(s, epsilon)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const METHODS: [SwitchingMethod; 4] = [
        SwitchingMethod::Tanh,
        SwitchingMethod::Linear,
        SwitchingMethod::Sign,
        SwitchingMethod::Sigmoid,
    ];

    #[test]
    fn test_saturation() {
        assert_eq!(tanh_switching(1e10, 1.0), 1.0);
        assert_eq!(tanh_switching(-1e10, 1.0), -1.0);
        assert_eq!(linear_switching(2.0, 1.0), 1.0);
        assert_eq!(linear_switching(-2.0, 1.0), -1.0);
        assert_eq!(sigmoid_switching(1e10, 1e-3), 1.0);
    }

    #[test]
    fn test_inside_boundary_layer() {
        assert_relative_eq!(tanh_switching(0.5, 1.0), 0.5f64.tanh());
        assert_relative_eq!(linear_switching(0.25, 0.5), 0.5);
        assert_relative_eq!(sigmoid_switching(1.5, 1.0), 2.0 / (1.0 + (-3.0f64).exp()) - 1.0);

        // 0.3 / 0.2 is not exact in binary
        assert_relative_eq!(
            sigmoid_switching(0.3, 0.2),
            2.0 / (1.0 + (-3.0f64).exp()) - 1.0,
            epsilon = 1e-12
        );
        assert_eq!(sign_switching(-0.1), -1.0);
    }

    #[test]
    fn test_zero_and_nan() {
        for m in METHODS.iter() {
            assert_eq!(m.compute(0.0, 0.1), 0.0);
            assert_eq!(m.compute(std::f64::NAN, 0.1), 0.0);
            assert_eq!(m.compute(std::f64::INFINITY, 0.1), 1.0);
            assert_eq!(m.compute(std::f64::NEG_INFINITY, 0.1), -1.0);
        }
    }

    #[test]
    fn test_non_positive_epsilon_gives_sign() {
        for m in METHODS.iter() {
            for eps in [0.0, -1.0, std::f64::NAN].iter() {
                assert_eq!(m.compute(0.3, *eps), 1.0);
                assert_eq!(m.compute(-0.3, *eps), -1.0);
                assert_eq!(m.compute(0.0, *eps), 0.0);
            }
        }
    }

    #[test]
    fn test_derivatives() {
        let eps = 0.5;

        assert_relative_eq!(SwitchingMethod::Tanh.derivative(0.0, eps), 2.0);
        assert_relative_eq!(
            SwitchingMethod::Tanh.derivative(0.2, eps),
            (1.0 - 0.4f64.tanh().powi(2)) / eps
        );
        assert_eq!(SwitchingMethod::Tanh.derivative(1e10, eps), 0.0);

        assert_eq!(SwitchingMethod::Linear.derivative(0.4, eps), 2.0);
        assert_eq!(SwitchingMethod::Linear.derivative(0.6, eps), 0.0);

        assert_eq!(SwitchingMethod::Sign.derivative(0.1, eps), 0.0);

        // Same slope as tanh at the origin
        assert_relative_eq!(SwitchingMethod::Sigmoid.derivative(0.0, eps), 2.0);
        assert_relative_eq!(
            SwitchingMethod::Sigmoid.derivative(0.2, eps),
            SwitchingMethod::Sigmoid.derivative(-0.2, eps)
        );

        assert_eq!(SwitchingMethod::Tanh.derivative(0.1, 0.0), 0.0);
    }

    #[test]
    fn test_deserialise() {
        #[derive(serde::Deserialize)]
        struct P {
            method: SwitchingMethod,
        }

        let p: P = util::params::load_str("method = \"sigmoid\"").unwrap();
        assert_eq!(p.method, SwitchingMethod::Sigmoid);
    }

    fn method_strategy() -> impl Strategy<Value = SwitchingMethod> {
        prop::sample::select(METHODS.to_vec())
    }

    proptest! {
        #[test]
        fn output_is_bounded(m in method_strategy(), s in -1e6..1e6f64, eps in 1e-6..10.0f64) {
            let v = m.compute(s, eps);
            prop_assert!(v >= -1.0 && v <= 1.0);
        }

        #[test]
        fn output_is_odd(m in method_strategy(), s in -1e3..1e3f64, eps in 1e-6..10.0f64) {
            prop_assert_eq!(m.compute(-s, eps), -m.compute(s, eps));
        }

        #[test]
        fn output_is_monotonic(
            m in method_strategy(),
            a in -100.0..100.0f64,
            b in -100.0..100.0f64,
            eps in 1e-3..10.0f64
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(m.compute(lo, eps) <= m.compute(hi, eps));
        }

        #[test]
        fn non_positive_layer_is_sign(m in method_strategy(), s in -100.0..100.0f64, eps in -10.0..=0.0f64) {
            prop_assert_eq!(m.compute(s, eps), sign(s));
        }
    }
}
