//! Boundary layer and reaching law helpers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use super::{tanh_switching, SwitchingError};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Widen the boundary layer when the surface moves quickly,
/// `epsilon_0 + gain |s_dot|`.
///
/// The width depends only on the surface rate, `_s` is accepted so callers
/// can pass the full surface state. A non-finite `s_dot` leaves the boundary
/// layer at `epsilon_0`.
pub fn adaptive_boundary_layer(
    _s: f64,
    s_dot: f64,
    epsilon_0: f64,
    gain: f64
) -> Result<f64, SwitchingError> {
    if !(epsilon_0.is_finite() && epsilon_0 > 0.0) {
        return Err(SwitchingError::InvalidParameter(format!(
            "the base boundary layer must be finite and positive, found {}", epsilon_0
        )));
    }
    if !(gain.is_finite() && gain >= 0.0) {
        return Err(SwitchingError::InvalidParameter(format!(
            "the boundary layer gain must be finite and non-negative, found {}", gain
        )));
    }

    if !s_dot.is_finite() {
        debug!("Non-finite surface rate {}, using the base boundary layer", s_dot);
        return Ok(epsilon_0);
    }

    Ok(epsilon_0 + gain * s_dot.abs())
}

/// Power rate reaching law, `-k |s|^alpha tanh(s / epsilon)`.
///
/// Requires `k > 0` and `0 < alpha <= 1`.
pub fn power_rate_reaching_law(
    s: f64,
    k: f64,
    alpha: f64,
    epsilon: f64
) -> Result<f64, SwitchingError> {
    if !(k.is_finite() && k > 0.0) {
        return Err(SwitchingError::InvalidParameter(format!(
            "the reaching gain must be finite and positive, found {}", k
        )));
    }
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(SwitchingError::InvalidParameter(format!(
            "the reaching exponent must lie in (0, 1], found {}", alpha
        )));
    }

    if s.is_nan() {
        return Ok(0.0);
    }

    Ok(-k * s.abs().powf(alpha) * tanh_switching(s, epsilon))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_adaptive_boundary_layer() {
        assert_eq!(adaptive_boundary_layer(0.4, 0.0, 0.1, 2.0).unwrap(), 0.1);
        assert_relative_eq!(adaptive_boundary_layer(0.4, -3.0, 0.1, 0.5).unwrap(), 1.6);
        assert_eq!(adaptive_boundary_layer(0.4, std::f64::NAN, 0.1, 0.5).unwrap(), 0.1);

        // The surface value itself does not widen the layer
        assert_eq!(
            adaptive_boundary_layer(-7.0, 2.0, 0.1, 0.5).unwrap(),
            adaptive_boundary_layer(7.0, 2.0, 0.1, 0.5).unwrap()
        );

        assert!(adaptive_boundary_layer(0.0, 1.0, 0.0, 0.5).is_err());
        assert!(adaptive_boundary_layer(0.0, 1.0, 0.1, -0.5).is_err());
    }

    #[test]
    fn test_power_rate_reaching_law() {
        // Opposes the sliding variable
        assert!(power_rate_reaching_law(2.0, 5.0, 0.5, 0.01).unwrap() < 0.0);
        assert!(power_rate_reaching_law(-2.0, 5.0, 0.5, 0.01).unwrap() > 0.0);
        assert_eq!(power_rate_reaching_law(0.0, 5.0, 0.5, 0.01).unwrap(), 0.0);

        // Saturated switching leaves -k |s|^alpha
        assert_relative_eq!(power_rate_reaching_law(4.0, 3.0, 0.5, 1e-3).unwrap(), -6.0);

        // alpha = 1 is allowed
        assert!(power_rate_reaching_law(1.0, 1.0, 1.0, 0.1).is_ok());
    }

    #[test]
    fn test_power_rate_invalid_params() {
        assert!(matches!(
            power_rate_reaching_law(1.0, 0.0, 0.5, 0.1),
            Err(SwitchingError::InvalidParameter(_))
        ));
        assert!(power_rate_reaching_law(1.0, -1.0, 0.5, 0.1).is_err());
        assert!(power_rate_reaching_law(1.0, 1.0, 0.0, 0.1).is_err());
        assert!(power_rate_reaching_law(1.0, 1.0, 1.5, 0.1).is_err());
        assert!(power_rate_reaching_law(1.0, 1.0, std::f64::NAN, 0.1).is_err());
    }
}
