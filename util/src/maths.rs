//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Sign of a value, returning zero for zero (of either sign) and for NaN.
///
/// Unlike `f64::signum` this never returns `1.0` for `+0.0`, which keeps
/// odd functions built on top of it exactly zero at the origin.
pub fn sign<T>(value: T) -> T
where
    T: Float
{
    if value > T::zero() {
        T::one()
    }
    else if value < T::zero() {
        -T::one()
    }
    else {
        T::zero()
    }
}

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Saturate a value into the symmetric range `[-limit, limit]`.
///
/// Returns the saturated value and whether saturation occured.
pub fn saturate<T>(value: T, limit: T) -> (T, bool)
where
    T: Float
{
    let limit = limit.abs();
    let sat = clamp(&value, &-limit, &limit);

    (sat, sat != value)
}

/// Replace a non-finite value with `fallback`.
pub fn finite_or<T>(value: T, fallback: T) -> T
where
    T: Float
{
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sign() {
        assert_eq!(sign(2.5f64), 1.0);
        assert_eq!(sign(-1e-300f64), -1.0);
        assert_eq!(sign(0f64), 0.0);
        assert_eq!(sign(-0f64), 0.0);
        assert_eq!(sign(f64::NAN), 0.0);
        assert_eq!(sign(f64::NEG_INFINITY), -1.0);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(5f64, 2f64), (2f64, true));
        assert_eq!(saturate(-5f64, 2f64), (-2f64, true));
        assert_eq!(saturate(1f64, 2f64), (1f64, false));
        assert_eq!(saturate(1f64, -2f64), (1f64, false));
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(f64::NAN, 0.0), 0.0);
        assert_eq!(finite_or(f64::INFINITY, 1.0), 1.0);
        assert_eq!(finite_or(3.0f64, 1.0), 3.0);
    }
}
