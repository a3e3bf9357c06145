//! Wilson score interval for a binomial proportion.
//!
//! Used for the confidence bounds on smoothed prevalence. The sample size is
//! an averaged respondent count, so it is a float rather than an integer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// z-score for a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

/// Lower and upper bound of a Wilson score interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilsonInterval {
    pub lower: f64,
    pub upper: f64,
}

impl WilsonInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, p: f64) -> bool {
        self.lower <= p && p <= self.upper
    }
}

/// Errors returned by interval computation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WilsonError {
    /// Sample size is zero, negative, or not finite.
    #[error("sample size must be positive")]
    EmptySample,
    /// Observed proportion lies outside [0, 1].
    #[error("rate must lie within [0, 1]")]
    RateOutOfRange,
    /// z-score is not a positive finite number.
    #[error("z-score must be positive")]
    InvalidZ,
}

/// Compute the Wilson score interval for proportion `p` over `n` trials.
///
/// ```text
/// denom  = 1 + z²/n
/// centre = p + z²/(2n)
/// sd     = sqrt((p(1-p) + z²/(4n)) / n)
/// bounds = (centre ∓ z·sd) / denom
/// ```
pub fn wilson_interval(p: f64, n: f64, z: f64) -> Result<WilsonInterval, WilsonError> {
    if !(z.is_finite() && z > 0.0) {
        return Err(WilsonError::InvalidZ);
    }
    if !(n.is_finite() && n > 0.0) {
        return Err(WilsonError::EmptySample);
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(WilsonError::RateOutOfRange);
    }

    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let centre = p + z2 / (2.0 * n);
    let sd = ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt();

    // Rounding can push the bounds a hair past the proportion at p = 0 or 1.
    let lower = ((centre - z * sd) / denom).clamp(0.0, p);
    let upper = ((centre + z * sd) / denom).clamp(p, 1.0);
    Ok(WilsonInterval { lower, upper })
}
