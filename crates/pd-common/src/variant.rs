//! Input file variants.
//!
//! The publisher ships the same strata twice: once with scale factors held
//! uniform per (date, region), once per (date, age group). The variant decides
//! which grouping the consistency verifier checks.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FileVariant {
    /// Scale factors uniform per (date, region).
    Region,
    /// Scale factors uniform per (date, age group).
    Age,
    /// No grouping is expected to carry a uniform scale factor.
    None,
}

impl fmt::Display for FileVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileVariant::Region => write!(f, "region"),
            FileVariant::Age => write!(f, "age"),
            FileVariant::None => write!(f, "none"),
        }
    }
}
