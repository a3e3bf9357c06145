//! Merged value totals.
//!
//! A `ValueTotals` is the `StratumValues`-shaped sum over any set of strata.
//! Counts are held as `f64` so the same type carries sums and window averages.

use pd_common::{ScaleFactor, StratumValues};
use pd_math::checked_ratio;
use serde::Serialize;

/// Output column names, in order.
pub const FIELD_NAMES: [&str; 11] = [
    "respondent_count",
    "unhealthy_count",
    "unhealthy_unknown_count",
    "predicted_positive_count",
    "predicted_positive_probability",
    "population",
    "corrected_positive_estimate",
    "corrected_positive_probability",
    "scale_factor",
    "scale_factor_probability",
    "symptom_based_estimate",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueTotals {
    pub respondent_count: f64,
    pub unhealthy_count: f64,
    pub unhealthy_unknown_count: f64,
    pub predicted_positive_count: f64,
    pub predicted_positive_probability: f64,
    pub population: f64,
    pub corrected_positive_estimate: f64,
    pub corrected_positive_probability: f64,
    pub scale_factor: ScaleFactor,
    pub scale_factor_probability: ScaleFactor,
    pub symptom_based_estimate: f64,
}

impl From<&StratumValues> for ValueTotals {
    fn from(v: &StratumValues) -> Self {
        Self {
            respondent_count: v.respondent_count as f64,
            unhealthy_count: v.unhealthy_count as f64,
            unhealthy_unknown_count: v.unhealthy_unknown_count as f64,
            predicted_positive_count: v.predicted_positive_count as f64,
            predicted_positive_probability: v.predicted_positive_probability,
            population: v.population as f64,
            corrected_positive_estimate: v.corrected_positive_estimate,
            corrected_positive_probability: v.corrected_positive_probability,
            scale_factor: v.scale_factor,
            scale_factor_probability: v.scale_factor_probability,
            symptom_based_estimate: v.symptom_based_estimate().unwrap_or(0.0),
        }
    }
}

impl ValueTotals {
    /// Empty totals for a synthetic row with no contributing strata.
    pub fn zero() -> Self {
        Self {
            respondent_count: 0.0,
            unhealthy_count: 0.0,
            unhealthy_unknown_count: 0.0,
            predicted_positive_count: 0.0,
            predicted_positive_probability: 0.0,
            population: 0.0,
            corrected_positive_estimate: 0.0,
            corrected_positive_probability: 0.0,
            scale_factor: ScaleFactor::Undefined,
            scale_factor_probability: ScaleFactor::Undefined,
            symptom_based_estimate: 0.0,
        }
    }

    /// Fold `other` into `self`: additive fields sum, scale factors must agree.
    pub fn merge(&mut self, other: &ValueTotals) {
        self.respondent_count += other.respondent_count;
        self.unhealthy_count += other.unhealthy_count;
        self.unhealthy_unknown_count += other.unhealthy_unknown_count;
        self.predicted_positive_count += other.predicted_positive_count;
        self.predicted_positive_probability += other.predicted_positive_probability;
        self.population += other.population;
        self.corrected_positive_estimate += other.corrected_positive_estimate;
        self.corrected_positive_probability += other.corrected_positive_probability;
        self.scale_factor = self.scale_factor.merge(other.scale_factor);
        self.scale_factor_probability = self
            .scale_factor_probability
            .merge(other.scale_factor_probability);
        self.symptom_based_estimate += other.symptom_based_estimate;
    }

    /// Merge a sequence of totals. `None` for an empty sequence.
    pub fn merged<'a, I>(items: I) -> Option<ValueTotals>
    where
        I: IntoIterator<Item = &'a ValueTotals>,
    {
        let mut iter = items.into_iter();
        let mut acc = iter.next()?.clone();
        for item in iter {
            acc.merge(item);
        }
        Some(acc)
    }

    /// Divide every additive field by `divisor`. Scale factors are left as-is.
    pub fn divided_by(&self, divisor: f64) -> ValueTotals {
        ValueTotals {
            respondent_count: self.respondent_count / divisor,
            unhealthy_count: self.unhealthy_count / divisor,
            unhealthy_unknown_count: self.unhealthy_unknown_count / divisor,
            predicted_positive_count: self.predicted_positive_count / divisor,
            predicted_positive_probability: self.predicted_positive_probability / divisor,
            population: self.population / divisor,
            corrected_positive_estimate: self.corrected_positive_estimate / divisor,
            corrected_positive_probability: self.corrected_positive_probability / divisor,
            scale_factor: self.scale_factor,
            scale_factor_probability: self.scale_factor_probability,
            symptom_based_estimate: self.symptom_based_estimate / divisor,
        }
    }

    /// Corrected prevalence, `corrected_positive_estimate / population`.
    pub fn covid_rate(&self) -> Option<f64> {
        checked_ratio(self.corrected_positive_estimate, self.population)
    }

    /// Additive fields in output order, for property checks.
    pub fn additive_fields(&self) -> [f64; 9] {
        [
            self.respondent_count,
            self.unhealthy_count,
            self.unhealthy_unknown_count,
            self.predicted_positive_count,
            self.predicted_positive_probability,
            self.population,
            self.corrected_positive_estimate,
            self.corrected_positive_probability,
            self.symptom_based_estimate,
        ]
    }

    /// Cells in `FIELD_NAMES` order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.respondent_count.to_string(),
            self.unhealthy_count.to_string(),
            self.unhealthy_unknown_count.to_string(),
            self.predicted_positive_count.to_string(),
            self.predicted_positive_probability.to_string(),
            self.population.to_string(),
            self.corrected_positive_estimate.to_string(),
            self.corrected_positive_probability.to_string(),
            self.scale_factor.to_string(),
            self.scale_factor_probability.to_string(),
            self.symptom_based_estimate.to_string(),
        ]
    }
}
