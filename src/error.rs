//! Error types for the equipment inventory core

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single field-level schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// Wire name of the offending field (e.g. `storageLocation`)
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A value did not conform to the equipment record schema.
///
/// Always carries every violation found, never only the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_violations(.violations))]
pub struct SchemaValidationError {
    pub violations: Vec<SchemaViolation>,
}

impl SchemaValidationError {
    pub fn new(violations: Vec<SchemaViolation>) -> Self {
        Self { violations }
    }

    /// True if any violation concerns the given wire field
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Schema validation failed: {0}")]
    Schema(#[from] SchemaValidationError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_every_violation() {
        let err = SchemaValidationError::new(vec![
            SchemaViolation::new("name", "must not be empty"),
            SchemaViolation::new("quantity", "must be at most 9999"),
        ]);
        assert_eq!(
            err.to_string(),
            "name: must not be empty; quantity: must be at most 9999"
        );
        assert!(err.has_field("quantity"));
        assert!(!err.has_field("status"));
    }

    #[test]
    fn test_app_error_wraps_schema_error() {
        let err: AppError = SchemaValidationError::new(vec![SchemaViolation::new("id", "is required")]).into();
        assert!(matches!(err, AppError::Schema(_)));
        assert_eq!(err.to_string(), "Schema validation failed: id: is required");
    }
}
