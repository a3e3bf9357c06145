//! Prevalence digest configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the digest config file
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - The versioned table of input column schemas

pub mod columns;
pub mod digest;
pub mod resolve;
pub mod validate;

pub use columns::{detect_schema, ColumnSchema, KeyColumns, SchemaDetectError, ValueColumns};
pub use digest::{DigestConfig, UFractionCheck, VariantPrefixes};
pub use resolve::{resolve_config, ConfigSource};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
