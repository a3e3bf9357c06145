//! Aggregate-level consistency checks.
//!
//! The publisher holds the scale factors uniform across one grouping (per
//! region or per age group, depending on the file). After accumulation the
//! row-level relationships must still hold on that grouping's totals.
//! Failures are reported, never fatal.

use chrono::NaiveDate;
use pd_common::{FileVariant, ScaleFactor};
use pd_config::DigestConfig;
use pd_math::{approx_eq, checked_ratio};
use serde::Serialize;
use tracing::{info, warn};

use crate::accumulate::{StrataDigest, ValueTotals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Strata in the unit carried different scale factors.
    NonUniformScaleFactor,
    NonUniformScaleFactorProbability,
    CorrectedExceedsPopulation,
    /// `scale_factor != corrected_positive_estimate / symptom_based_estimate`
    ScaleFactor,
    /// `scale_factor_probability != corrected_positive_estimate / corrected_positive_probability`
    ScaleFactorProbability,
}

/// One failed aggregate check, with the full totals of the offending row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyMismatch {
    pub grouping: &'static str,
    pub unit: String,
    pub date: NaiveDate,
    pub kind: MismatchKind,
    pub expected: Option<f64>,
    pub actual: Option<f64>,
    pub totals: ValueTotals,
}

/// Check every row of the grouping selected by `variant`.
pub fn verify(
    digest: &StrataDigest,
    variant: FileVariant,
    config: &DigestConfig,
) -> Vec<ConsistencyMismatch> {
    let rows: Vec<(NaiveDate, &str, &ValueTotals)> = match variant {
        FileVariant::Region => digest
            .region
            .iter()
            .map(|((date, region), totals)| (*date, region.as_str(), totals))
            .collect(),
        FileVariant::Age => digest
            .age
            .iter()
            .map(|((date, age), totals)| (*date, age.as_str(), totals))
            .collect(),
        FileVariant::None => {
            info!("no uniform grouping for this input; skipping consistency checks");
            return Vec::new();
        }
    };
    let grouping = match variant {
        FileVariant::Age => "age",
        _ => "region",
    };

    let mut mismatches = Vec::new();
    for (date, unit, totals) in rows {
        for (kind, expected, actual) in check_totals(totals, config.tolerance) {
            warn!(
                grouping,
                unit,
                %date,
                ?kind,
                ?expected,
                ?actual,
                "consistency mismatch"
            );
            mismatches.push(ConsistencyMismatch {
                grouping,
                unit: unit.to_string(),
                date,
                kind,
                expected,
                actual,
                totals: totals.clone(),
            });
        }
    }
    info!(grouping, mismatches = mismatches.len(), "consistency checks done");
    mismatches
}

pub type Finding = (MismatchKind, Option<f64>, Option<f64>);

/// Re-derive the row-level relationships on merged totals.
pub fn check_totals(totals: &ValueTotals, tol: f64) -> Vec<Finding> {
    if totals.scale_factor.is_undefined() {
        return Vec::new();
    }
    let mut found = Vec::new();

    if totals.corrected_positive_estimate > totals.population {
        found.push((
            MismatchKind::CorrectedExceedsPopulation,
            Some(totals.population),
            Some(totals.corrected_positive_estimate),
        ));
    }

    match totals.scale_factor {
        ScaleFactor::Value(factor) => {
            if let Some(derived) =
                checked_ratio(totals.corrected_positive_estimate, totals.symptom_based_estimate)
            {
                if !approx_eq(factor, derived, tol) {
                    found.push((MismatchKind::ScaleFactor, Some(factor), Some(derived)));
                }
            }
        }
        ScaleFactor::Inconsistent => found.push((MismatchKind::NonUniformScaleFactor, None, None)),
        ScaleFactor::Undefined => {}
    }

    match totals.scale_factor_probability {
        ScaleFactor::Value(factor) => {
            if let Some(derived) = checked_ratio(
                totals.corrected_positive_estimate,
                totals.corrected_positive_probability,
            ) {
                if !approx_eq(factor, derived, tol) {
                    found.push((
                        MismatchKind::ScaleFactorProbability,
                        Some(factor),
                        Some(derived),
                    ));
                }
            }
        }
        ScaleFactor::Inconsistent => {
            found.push((MismatchKind::NonUniformScaleFactorProbability, None, None))
        }
        ScaleFactor::Undefined => {}
    }

    found
}
