//! Prevalence digest engine.
//!
//! This crate provides:
//! - Record parsing with per-row invariant checks
//! - Accumulation into region, age, UTLA, deprivation and age×deprivation groupings
//! - Trailing-window averages with Wilson score intervals
//! - Aggregate consistency verification
//! - Deterministic CSV tables and a run manifest
//! - The `pd-core` command-line entry point

pub mod accumulate;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod rolling;
pub mod verify;

pub use exit_codes::ExitCode;
pub use pipeline::{build_digest, run_file, DigestOutcome, RunReport};
