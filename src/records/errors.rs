//! # Record Errors
//!
//! Error types for record validation and storage.

use thiserror::Error;

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Record errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// No record with the requested id
    #[error("The requested record is not found")]
    NotFound,

    /// A record with this id already exists
    #[error("A record with id '{0}' already exists")]
    AlreadyExists(String),

    /// Record does not satisfy the live schema
    #[error("{0}")]
    BadInput(String),

    /// Underlying storage failed
    #[error("Record storage error: {0}")]
    Storage(String),
}

impl RecordError {
    /// Returns the symbolic status string
    pub fn code(&self) -> &'static str {
        match self {
            RecordError::NotFound => "DB_ERROR_RESOURCE_NOT_FOUND",
            RecordError::AlreadyExists(_) => "DB_ERROR_RESOURCE_CONFLICT",
            RecordError::BadInput(_) => "DB_ERROR_BAD_INPUT_REQUEST",
            RecordError::Storage(_) => "DB_ERROR_INTERNAL_ERROR",
        }
    }

    pub(crate) fn unknown_field(field: &str) -> Self {
        RecordError::BadInput(format!("The field '{}' is not defined in the schema", field))
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        RecordError::BadInput(format!("The required field '{}' is not present", field))
    }

    pub(crate) fn type_mismatch(field: &str, expected: &str, actual: &str) -> Self {
        RecordError::BadInput(format!(
            "The field '{}' should be of type {}, got {}",
            field, expected, actual
        ))
    }
}
