//! Configuration validation errors.

use thiserror::Error;

/// Result alias for config loading and validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    IoError(String),

    #[error("{0}")]
    ParseError(String),

    #[error("config schema version {found} is not compatible with {expected}")]
    IncompatibleVersion { found: String, expected: String },

    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Collects semantic problems so all of them are reported at once.
#[derive(Debug, Default)]
pub(crate) struct Problems(Vec<String>);

impl Problems {
    pub(crate) fn check(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.0.push(message());
        }
    }

    pub(crate) fn finish(self) -> ValidationResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Invalid(self.0))
        }
    }
}
