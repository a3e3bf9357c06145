//! Tolerance comparisons and integrality checks.
//!
//! The publisher computes its estimates in double precision, so re-derived
//! quantities only match up to rounding. Comparisons use a tolerance that is
//! absolute near zero and relative for large magnitudes.

/// Compare two values with a mixed absolute/relative tolerance.
///
/// Returns true when `|a - b| <= tol * max(1, |a|, |b|)`. NaN never compares equal.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a == b {
        return true;
    }
    let scale = 1.0_f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= tol * scale
}

/// Interpret a float as an exact non-negative integer.
///
/// Returns `None` for fractional, negative, non-finite, or out-of-range values.
pub fn exact_u64(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    // 2^53: beyond this not every integer is representable.
    if value > 9_007_199_254_740_992.0 {
        return None;
    }
    Some(value as u64)
}

/// Ratio that is defined only for a non-zero denominator.
pub fn checked_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_absolute_near_zero() {
        assert!(approx_eq(0.0, 5e-12, 1e-11));
        assert!(!approx_eq(0.0, 5e-11, 1e-11));
    }

    #[test]
    fn approx_eq_relative_for_large_values() {
        let a = 1.0e6;
        let b = a * (1.0 + 5e-12);
        assert!(approx_eq(a, b, 1e-11));
        assert!(!approx_eq(a, a * (1.0 + 5e-10), 1e-11));
    }

    #[test]
    fn approx_eq_rejects_nan() {
        assert!(!approx_eq(f64::NAN, f64::NAN, 1.0));
        assert!(approx_eq(f64::INFINITY, f64::INFINITY, 1e-11));
    }

    #[test]
    fn exact_u64_accepts_integral_values() {
        assert_eq!(exact_u64(0.0), Some(0));
        assert_eq!(exact_u64(1200.0), Some(1200));
    }

    #[test]
    fn exact_u64_rejects_non_integers() {
        assert_eq!(exact_u64(1.5), None);
        assert_eq!(exact_u64(-1.0), None);
        assert_eq!(exact_u64(f64::INFINITY), None);
        assert_eq!(exact_u64(f64::NAN), None);
        assert_eq!(exact_u64(1e300), None);
    }

    #[test]
    fn checked_ratio_guards_zero() {
        assert_eq!(checked_ratio(1.0, 0.0), None);
        assert_eq!(checked_ratio(3.0, 2.0), Some(1.5));
    }
}
