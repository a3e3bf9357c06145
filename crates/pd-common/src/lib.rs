//! Prevalence digest common types and errors.
//!
//! This crate provides foundational types shared across the digest crates:
//! - Stratum keys and typed per-stratum values
//! - The tagged scale-factor value used by every merge
//! - The unified error type for fatal conditions
//! - Output schema versioning
//! - Input file variants

pub mod error;
pub mod record;
pub mod schema;
pub mod variant;

pub use error::{Error, Result, RowSnapshot};
pub use record::{parse_date, Record, ScaleFactor, StratumKey, StratumValues};
pub use schema::{same_major, SCHEMA_VERSION};
pub use variant::FileVariant;
