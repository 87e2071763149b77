//! Custom error types for envelope-fixit
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for envelope-fixit operations
#[derive(Error, Debug)]
pub enum FixitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and engine preconditions
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A pending decision was already applied
    #[error("Decision {token} was already applied (option {option})")]
    AlreadyApplied { token: String, option: String },

    /// CSV budget import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FixitError {
    /// Create a "not found" error for envelope rules
    pub fn rule_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Envelope rule",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for routing overrides
    pub fn override_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Routing override",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for pending decisions
    pub fn decision_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Pending decision",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for FixitError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FixitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for FixitError {
    fn from(err: csv::Error) -> Self {
        Self::Import(err.to_string())
    }
}

/// Result type alias for envelope-fixit operations
pub type FixitResult<T> = Result<T, FixitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FixitError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = FixitError::rule_not_found("Rent");
        assert_eq!(err.to_string(), "Envelope rule not found: Rent");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_already_applied_error() {
        let err = FixitError::AlreadyApplied {
            token: "dec-1234abcd".into(),
            option: "B".into(),
        };
        assert_eq!(
            err.to_string(),
            "Decision dec-1234abcd was already applied (option B)"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let fixit_err: FixitError = io_err.into();
        assert!(matches!(fixit_err, FixitError::Io(_)));
    }
}
