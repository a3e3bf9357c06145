//! Error types for the prevalence digest.
//!
//! Only fatal conditions live here. Aggregate-level consistency mismatches and
//! degenerate rolling windows are reported as data by `pd-core`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::record::StratumKey;

/// Result type alias for digest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Raw text of one input row, in column order.
///
/// Carried by every fatal row-level error so the offending row can be found
/// again in the upstream file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowSnapshot(pub Vec<(String, String)>);

impl RowSnapshot {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for RowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", name, value)?;
        }
        Ok(())
    }
}

/// Unified error type for the prevalence digest.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Schema and format errors (20-29)
    #[error("unrecognized input schema: {0}")]
    Schema(String),

    #[error("format error at line {line}, field '{field}': {detail}; row: {row}")]
    Format {
        line: u64,
        field: String,
        detail: String,
        row: RowSnapshot,
    },

    // Invariant errors (30-39)
    #[error("invariant violated at line {line} for {key}: {invariant}; row: {row}")]
    InvariantViolation {
        line: u64,
        key: Box<StratumKey>,
        invariant: String,
        row: RowSnapshot,
    },

    #[error("sub-area count for {key} changed from {existing} to {incoming}")]
    SubAreaConflict {
        key: String,
        existing: u64,
        incoming: u64,
    },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in logs and the manifest.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Schema(_) => 20,
            Error::Format { .. } => 21,
            Error::InvariantViolation { .. } => 30,
            Error::SubAreaConflict { .. } => 31,
            Error::Io(_) => 60,
            Error::Csv(_) => 61,
            Error::Json(_) => 62,
        }
    }

    /// Whether the error was caused by the content of the input rows,
    /// as opposed to configuration or the environment.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::Format { .. } | Error::InvariantViolation { .. } | Error::SubAreaConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RowSnapshot {
        RowSnapshot(vec![
            ("date".to_string(), "20220601".to_string()),
            ("population".to_string(), "".to_string()),
        ])
    }

    #[test]
    fn snapshot_display_quotes_values() {
        assert_eq!(snapshot().to_string(), r#"date="20220601", population="""#);
    }

    #[test]
    fn snapshot_lookup_by_column() {
        let row = snapshot();
        assert_eq!(row.get("date"), Some("20220601"));
        assert_eq!(row.get("population"), Some(""));
        assert_eq!(row.get("region"), None);
    }

    #[test]
    fn format_error_mentions_line_and_field() {
        let err = Error::Format {
            line: 7,
            field: "population".to_string(),
            detail: "missing value".to_string(),
            row: snapshot(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("'population'"));
        assert_eq!(err.code(), 21);
        assert!(err.is_data_error());
    }

    #[test]
    fn io_errors_are_not_data_errors() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.code(), 60);
        assert!(!err.is_data_error());
    }
}
