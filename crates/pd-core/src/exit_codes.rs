//! Exit codes for the pd-core CLI.
//!
//! Exit codes communicate the outcome of a run without requiring output
//! parsing. With several inputs the worst (highest) code wins.

use pd_common::Error;

/// Exit codes for pd-core runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ExitCode {
    /// Every input digested, every check passed
    Clean = 0,

    /// Digests written, but at least one aggregate failed a consistency check
    Inconsistent = 1,

    /// Configuration error
    ConfigError = 10,

    /// Input header matches no known column layout
    SchemaError = 11,

    /// A field could not be parsed
    FormatError = 12,

    /// A row broke one of the record invariants
    InvariantViolation = 13,

    /// I/O error
    IoError = 14,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates that output was produced.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::Inconsistent)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Map a fatal error to its exit code.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::Schema(_) => ExitCode::SchemaError,
            Error::Format { .. } | Error::Csv(_) => ExitCode::FormatError,
            Error::InvariantViolation { .. } | Error::SubAreaConflict { .. } => {
                ExitCode::InvariantViolation
            }
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
