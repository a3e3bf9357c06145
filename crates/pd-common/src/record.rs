//! Stratum keys and per-stratum values.
//!
//! One input row describes one stratum on one date. The key tuple is
//! `(date, region, utla, district, age_group, imd)`; the payload is the
//! publisher's counts, estimates and scale factors for that stratum.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date formats accepted in the `date` column.
const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];

/// Parse a calendar date as written by the publisher (`20220622`) or in ISO form.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
}

/// Identifies one input row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StratumKey {
    pub date: NaiveDate,
    pub region: String,
    /// Upper-tier local authority code.
    pub utla: String,
    /// Local authority district code.
    pub district: String,
    pub age_group: String,
    /// Index of multiple deprivation bucket.
    pub imd: String,
}

impl fmt::Display for StratumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(date={}, region={}, utla={}, district={}, age_group={}, imd={})",
            self.date, self.region, self.utla, self.district, self.age_group, self.imd
        )
    }
}

/// A publisher-derived multiplier.
///
/// Scale factors are never summed. Merging two equal values keeps the value;
/// merging anything else yields `Inconsistent`, which callers must treat as
/// undefined rather than zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScaleFactor {
    Value(f64),
    /// Published as `inf` for degenerate strata.
    Undefined,
    Inconsistent,
}

impl ScaleFactor {
    pub fn value(self) -> Option<f64> {
        match self {
            ScaleFactor::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, ScaleFactor::Undefined)
    }

    /// Equal-or-inconsistent merge.
    pub fn merge(self, other: ScaleFactor) -> ScaleFactor {
        match (self, other) {
            (ScaleFactor::Value(a), ScaleFactor::Value(b)) if a == b => ScaleFactor::Value(a),
            (ScaleFactor::Undefined, ScaleFactor::Undefined) => ScaleFactor::Undefined,
            _ => ScaleFactor::Inconsistent,
        }
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleFactor::Value(v) => write!(f, "{}", v),
            ScaleFactor::Undefined => f.write_str("inf"),
            ScaleFactor::Inconsistent => Ok(()),
        }
    }
}

/// Validated numeric payload of one stratum row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumValues {
    pub respondent_count: u64,
    pub unhealthy_count: u64,
    /// Unwell participants counted under the secondary reporting channel.
    pub unhealthy_unknown_count: u64,
    pub predicted_positive_count: u64,
    pub predicted_positive_probability: f64,
    /// Fixed per stratum across all dates.
    pub population: u64,
    pub corrected_positive_estimate: f64,
    pub corrected_positive_probability: f64,
    pub scale_factor: ScaleFactor,
    pub scale_factor_probability: ScaleFactor,
    /// Number of small sub-areas feeding the (region, utla, district, imd) key.
    /// Not a survey quantity; never merged additively.
    pub sub_area_count: Option<u64>,
}

impl StratumValues {
    /// Share of unwell reports that came through the secondary channel.
    /// Defined as 1 when nobody reported feeling unwell.
    pub fn u_fraction(&self) -> f64 {
        if self.unhealthy_count == 0 {
            1.0
        } else {
            self.unhealthy_unknown_count as f64 / self.unhealthy_count as f64
        }
    }

    /// Effective respondent denominator, `respondent_count * u_fraction`.
    pub fn effective_respondents(&self) -> f64 {
        self.respondent_count as f64 * self.u_fraction()
    }

    /// Population-scaled projection of `predicted_positive_count`.
    ///
    /// `None` when the effective respondent denominator is zero.
    pub fn symptom_based_estimate(&self) -> Option<f64> {
        let denom = self.effective_respondents();
        if denom == 0.0 {
            return None;
        }
        Some(self.predicted_positive_count as f64 * self.population as f64 / denom)
    }

    /// Whether this stratum counts towards the defined-population denominator.
    pub fn is_defined(&self) -> bool {
        self.unhealthy_unknown_count > 0
    }
}

/// One parsed and validated input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based line number in the source file (header is line 1).
    pub line: u64,
    pub key: StratumKey,
    pub values: StratumValues,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> StratumValues {
        StratumValues {
            respondent_count: 500,
            unhealthy_count: 100,
            unhealthy_unknown_count: 80,
            predicted_positive_count: 20,
            predicted_positive_probability: 25.0,
            population: 1000,
            corrected_positive_estimate: 60.0,
            corrected_positive_probability: 50.0,
            scale_factor: ScaleFactor::Value(1.5),
            scale_factor_probability: ScaleFactor::Value(1.2),
            sub_area_count: None,
        }
    }

    #[test]
    fn parses_publisher_and_iso_dates() {
        let expected = NaiveDate::from_ymd_opt(2022, 6, 22).unwrap();
        assert_eq!(parse_date("20220622"), Some(expected));
        assert_eq!(parse_date("2022-06-22"), Some(expected));
        assert_eq!(parse_date("22/06/2022"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn u_fraction_defaults_to_one_without_unwell() {
        let mut v = values();
        v.unhealthy_count = 0;
        v.unhealthy_unknown_count = 0;
        assert_eq!(v.u_fraction(), 1.0);
    }

    #[test]
    fn symptom_based_estimate_scales_to_population() {
        let v = values();
        // 20 * 1000 / (500 * 0.8)
        assert!((v.symptom_based_estimate().unwrap() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn symptom_based_estimate_absent_without_respondents() {
        let mut v = values();
        v.respondent_count = 0;
        assert_eq!(v.symptom_based_estimate(), None);
    }

    #[test]
    fn scale_factor_merge_rules() {
        let a = ScaleFactor::Value(1.5);
        assert_eq!(a.merge(a), a);
        assert_eq!(a.merge(ScaleFactor::Value(1.6)), ScaleFactor::Inconsistent);
        assert_eq!(a.merge(ScaleFactor::Undefined), ScaleFactor::Inconsistent);
        assert_eq!(
            ScaleFactor::Undefined.merge(ScaleFactor::Undefined),
            ScaleFactor::Undefined
        );
        assert_eq!(
            ScaleFactor::Inconsistent.merge(ScaleFactor::Inconsistent),
            ScaleFactor::Inconsistent
        );
    }

    #[test]
    fn scale_factor_rendering() {
        assert_eq!(ScaleFactor::Value(1.5).to_string(), "1.5");
        assert_eq!(ScaleFactor::Undefined.to_string(), "inf");
        assert_eq!(ScaleFactor::Inconsistent.to_string(), "");
    }

    #[test]
    fn scale_factor_serde_is_tagged() {
        let json = serde_json::to_string(&ScaleFactor::Value(2.0)).unwrap();
        assert_eq!(json, r#"{"kind":"value","value":2.0}"#);
        let back: ScaleFactor = serde_json::from_str(r#"{"kind":"undefined"}"#).unwrap();
        assert_eq!(back, ScaleFactor::Undefined);
    }

    #[test]
    fn key_display_lists_every_component() {
        let key = StratumKey {
            date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
            region: "London".to_string(),
            utla: "E09000001".to_string(),
            district: "E09000001".to_string(),
            age_group: "0-17".to_string(),
            imd: "1".to_string(),
        };
        let shown = key.to_string();
        assert!(shown.starts_with("(date=2022-06-01, region=London"));
        assert!(shown.ends_with("imd=1)"));
    }
}
