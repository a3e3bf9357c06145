//! Digest run configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use chrono::NaiveDate;
use pd_common::{same_major, FileVariant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::validate::{Problems, ValidationError, ValidationResult};
use crate::CONFIG_SCHEMA_VERSION;

/// Complete digest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub schema_version: String,

    /// Trailing window lengths, in days, for the rolling-average tables.
    pub windows: Vec<usize>,

    /// z-score for the Wilson interval on smoothed prevalence.
    pub z_score: f64,

    /// Tolerance for re-derived invariants (mixed absolute/relative).
    pub tolerance: f64,

    /// Regions excluded from the England total.
    pub nations: Vec<String>,

    pub england_label: String,
    pub uk_label: String,

    pub variant_prefixes: VariantPrefixes,

    /// Sanity check on `u_fraction` for rows before the reporting-flow change.
    pub u_fraction_check: Option<UFractionCheck>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            windows: vec![8, 14],
            z_score: 1.96,
            tolerance: 1e-11,
            nations: vec![
                "Wales".to_string(),
                "Scotland".to_string(),
                "Northern Ireland".to_string(),
            ],
            england_label: "England".to_string(),
            uk_label: "UK".to_string(),
            variant_prefixes: VariantPrefixes::default(),
            u_fraction_check: Some(UFractionCheck::default()),
        }
    }
}

impl DigestConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: &std::path::Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse a config from a JSON string.
    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if !same_major(&self.schema_version, CONFIG_SCHEMA_VERSION) {
            return Err(ValidationError::IncompatibleVersion {
                found: self.schema_version.clone(),
                expected: CONFIG_SCHEMA_VERSION.to_string(),
            });
        }

        let mut problems = Problems::default();
        problems.check(!self.windows.is_empty(), || {
            "windows must list at least one length".to_string()
        });
        problems.check(self.windows.iter().all(|&n| n >= 1), || {
            "window lengths must be at least 1".to_string()
        });
        let distinct: BTreeSet<_> = self.windows.iter().collect();
        problems.check(distinct.len() == self.windows.len(), || {
            "window lengths must be distinct".to_string()
        });
        problems.check(self.z_score.is_finite() && self.z_score > 0.0, || {
            format!("z_score must be positive, got {}", self.z_score)
        });
        problems.check(self.tolerance > 0.0 && self.tolerance < 1e-3, || {
            format!("tolerance must lie in (0, 1e-3), got {}", self.tolerance)
        });
        problems.check(!self.england_label.is_empty() && !self.uk_label.is_empty(), || {
            "england_label and uk_label must be non-empty".to_string()
        });
        problems.check(self.england_label != self.uk_label, || {
            "england_label and uk_label must differ".to_string()
        });
        if let Some(check) = &self.u_fraction_check {
            problems.check((0.0..=1.0).contains(&check.min_fraction), || {
                format!(
                    "u_fraction_check.min_fraction must lie in [0, 1], got {}",
                    check.min_fraction
                )
            });
        }
        problems.finish()
    }

    /// Windows in ascending order, as used for output table naming.
    pub fn sorted_windows(&self) -> Vec<usize> {
        let mut windows = self.windows.clone();
        windows.sort_unstable();
        windows
    }

    pub fn is_nation(&self, region: &str) -> bool {
        self.nations.iter().any(|n| n == region)
    }
}

/// File-name prefixes that identify each input variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantPrefixes {
    pub region: String,
    pub age: String,
}

impl Default for VariantPrefixes {
    fn default() -> Self {
        Self {
            region: "corrected_prevalence_region_trend_".to_string(),
            age: "corrected_prevalence_age_trend_".to_string(),
        }
    }
}

impl VariantPrefixes {
    /// Classify an input by its file stem.
    pub fn detect(&self, stem: &str) -> FileVariant {
        if !self.region.is_empty() && stem.starts_with(&self.region) {
            FileVariant::Region
        } else if !self.age.is_empty() && stem.starts_with(&self.age) {
            FileVariant::Age
        } else {
            FileVariant::None
        }
    }
}

/// Before `before`, the secondary-channel share of unwell reports stayed high.
/// Rows with at least `min_unhealthy` unwell reports must have
/// `u_fraction >= min_fraction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UFractionCheck {
    pub before: NaiveDate,
    pub min_unhealthy: u64,
    pub min_fraction: f64,
}

impl Default for UFractionCheck {
    fn default() -> Self {
        Self {
            // Reporting moved to the new symptom flow on this date.
            before: NaiveDate::from_ymd_opt(2022, 6, 22).unwrap_or_default(),
            min_unhealthy: 10,
            min_fraction: 0.8,
        }
    }
}
