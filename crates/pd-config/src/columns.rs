//! Versioned input column schemas.
//!
//! Each published layout is described once, together with the set of column
//! names that identifies it. An input header is matched against every
//! signature; the most specific matching layout wins. The rest of the digest
//! only ever sees the internal field model.

use serde::Serialize;
use thiserror::Error;

/// Column names of the six key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyColumns {
    pub date: &'static str,
    pub region: &'static str,
    pub utla: &'static str,
    pub district: &'static str,
    pub age_group: &'static str,
    pub imd: &'static str,
}

/// Column names of the ten survey value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueColumns {
    pub respondent_count: &'static str,
    pub unhealthy_count: &'static str,
    pub unhealthy_unknown_count: &'static str,
    pub predicted_positive_count: &'static str,
    pub predicted_positive_probability: &'static str,
    pub population: &'static str,
    pub corrected_positive_estimate: &'static str,
    pub corrected_positive_probability: &'static str,
    pub scale_factor: &'static str,
    pub scale_factor_probability: &'static str,
}

/// One published input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub keys: KeyColumns,
    pub values: ValueColumns,
    /// Column holding the per-(region, utla, district, imd) sub-area count.
    /// Its published name suggests a demographic attribute; it is not one.
    pub sub_area: Option<&'static str>,
    /// Columns whose joint presence identifies this layout.
    pub signature: &'static [&'static str],
}

impl ColumnSchema {
    /// Every column the layout requires, keys first.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let k = &self.keys;
        let v = &self.values;
        let mut cols = vec![
            k.date,
            k.region,
            k.utla,
            k.district,
            k.age_group,
            k.imd,
            v.respondent_count,
            v.unhealthy_count,
            v.unhealthy_unknown_count,
            v.predicted_positive_count,
            v.predicted_positive_probability,
            v.population,
            v.corrected_positive_estimate,
            v.corrected_positive_probability,
            v.scale_factor,
            v.scale_factor_probability,
        ];
        cols.extend(self.sub_area);
        cols
    }

    fn matches(&self, headers: &[&str]) -> bool {
        self.signature.iter().all(|col| headers.contains(col))
    }
}

const UTLA19_KEYS: KeyColumns = KeyColumns {
    date: "date",
    region: "region",
    utla: "UTLA19CD",
    district: "lad16cd",
    age_group: "age_group",
    imd: "imd",
};

const COVID_VALUES: ValueColumns = ValueColumns {
    respondent_count: "respondent_count",
    unhealthy_count: "unhealthy_count",
    unhealthy_unknown_count: "unhealthy_unk_count",
    predicted_positive_count: "predicted_covid_positive_count",
    predicted_positive_probability: "predicted_covid_positive_prob",
    population: "population",
    corrected_positive_estimate: "corrected_covid_positive",
    corrected_positive_probability: "corrected_covid_positive_prob",
    scale_factor: "factor",
    scale_factor_probability: "factor_prob",
};

/// All known layouts, oldest first.
pub static SCHEMAS: [ColumnSchema; 2] = [
    ColumnSchema {
        name: "utla19",
        keys: UTLA19_KEYS,
        values: COVID_VALUES,
        sub_area: None,
        signature: &["UTLA19CD", "lad16cd", "unhealthy_unk_count", "factor", "factor_prob"],
    },
    ColumnSchema {
        name: "utla19_imd_count",
        keys: UTLA19_KEYS,
        values: COVID_VALUES,
        sub_area: Some("imd_count"),
        signature: &[
            "UTLA19CD",
            "lad16cd",
            "unhealthy_unk_count",
            "factor",
            "factor_prob",
            "imd_count",
        ],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaDetectError {
    #[error("no known layout matches header [{}]", .headers.join(", "))]
    NoMatch { headers: Vec<String> },

    #[error("header matches several layouts equally well: {}", .candidates.join(", "))]
    Ambiguous { candidates: Vec<&'static str> },
}

/// Select the layout of an input file from its header row.
pub fn detect_schema(headers: &[&str]) -> Result<&'static ColumnSchema, SchemaDetectError> {
    detect_in(&SCHEMAS, headers)
}

fn detect_in<'a>(
    schemas: &'a [ColumnSchema],
    headers: &[&str],
) -> Result<&'a ColumnSchema, SchemaDetectError> {
    let matching: Vec<&ColumnSchema> = schemas.iter().filter(|s| s.matches(headers)).collect();
    let best = matching
        .iter()
        .map(|s| s.signature.len())
        .max()
        .ok_or_else(|| SchemaDetectError::NoMatch {
            headers: headers.iter().map(|h| h.to_string()).collect(),
        })?;

    let top: Vec<&ColumnSchema> = matching
        .into_iter()
        .filter(|s| s.signature.len() == best)
        .collect();
    match top.as_slice() {
        [single] => Ok(*single),
        many => Err(SchemaDetectError::Ambiguous {
            candidates: many.iter().map(|s| s.name).collect(),
        }),
    }
}
