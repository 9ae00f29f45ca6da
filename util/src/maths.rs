//! Utility maths functions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value between `min` and `max`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range (-pi, pi].
///
/// This is the angle convention used for every heading and bearing in the
/// navigation software. Exactly -pi maps to +pi.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    // Already in range, return untouched so that small values don't pick up
    // rounding error from the modulo
    if angle > -pi_t && angle <= pi_t {
        return angle
    }

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Get the signed shortest angular distance from `a` to `b`, in (-pi, pi].
pub fn ang_diff<T>(a: T, b: T) -> T
where
    T: Float
{
    wrap_pi(b - a)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((-1f64, 1f64), (276f64, 450f64), -1.0), 276.0);
        assert_eq!(lin_map((-1f64, 1f64), (276f64, 450f64), 1.0), 450.0);
        assert_eq!(lin_map((-1f64, 1f64), (276f64, 450f64), 0.0), 363.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(2f64, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-2f64, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25f64, -1.0, 1.0), 0.25);
    }

    #[test]
    fn test_wrap_pi() {
        assert_eq!(wrap_pi(1f64), 1f64);
        assert_eq!(wrap_pi(PI), PI);
        assert_eq!(wrap_pi(-PI), PI);
        assert!((wrap_pi(TAU + 1.0) - 1.0).abs() < 1e-12);
        assert!((wrap_pi(-TAU - 1.0) + 1.0).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_ang_diff() {
        assert_eq!(ang_diff(1f64, 2f64), 1f64);
        assert_eq!(ang_diff(2f64, 1f64), -1f64);
        assert!(ang_diff(0f64, TAU).abs() < 1e-12);
        assert!((ang_diff(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-12);
        assert!((ang_diff(-PI + 0.1, PI - 0.1) + 0.2).abs() < 1e-12);
    }
}
