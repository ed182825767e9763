//! Schema error types
//!
//! Every registry and validator failure carries a closed error kind and a
//! human-readable message. Kinds have a symbolic status:
//! - SCHEMA_ERROR_RESOURCE_NOT_FOUND
//! - SCHEMA_ERROR_RESOURCE_CONFLICT
//! - SCHEMA_ERROR_VALIDATION_CHECK_FAILED
//! - SCHEMA_ERROR_BAD_INPUT_REQUEST
//! - SCHEMA_ERROR_FORBIDDEN
//! - SCHEMA_ERROR_UNAUTHORIZED
//! - SCHEMA_ERROR_INTERNAL_ERROR
//!
//! Translation to transport status codes happens at the HTTP boundary only.

use std::fmt;

/// Schema error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Field does not exist
    NotFound,
    /// Field already exists
    Conflict,
    /// Stored schema failed a structural check
    ValidationFailed,
    /// Caller-supplied definition is malformed or touches a system field
    BadInput,
    Forbidden,
    Unauthorized,
    /// Persistence or load failure
    Internal,
}

impl SchemaErrorKind {
    /// Returns the symbolic status string
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorKind::NotFound => "SCHEMA_ERROR_RESOURCE_NOT_FOUND",
            SchemaErrorKind::Conflict => "SCHEMA_ERROR_RESOURCE_CONFLICT",
            SchemaErrorKind::ValidationFailed => "SCHEMA_ERROR_VALIDATION_CHECK_FAILED",
            SchemaErrorKind::BadInput => "SCHEMA_ERROR_BAD_INPUT_REQUEST",
            SchemaErrorKind::Forbidden => "SCHEMA_ERROR_FORBIDDEN",
            SchemaErrorKind::Unauthorized => "SCHEMA_ERROR_UNAUTHORIZED",
            SchemaErrorKind::Internal => "SCHEMA_ERROR_INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

const TYPE_HINT: &str = "The field \"type\" should have the one of the possible values \
\"String\", \"Number\", \"Date\", \"Boolean\", [\"String\"], [\"Number\"], [\"Date\"], [\"Boolean\"]";

/// Schema error with kind and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    kind: SchemaErrorKind,
    message: String,
}

impl SchemaError {
    pub fn new(kind: SchemaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Field lookup failed
    pub fn not_found() -> Self {
        Self::new(SchemaErrorKind::NotFound, "The request resource is not found")
    }

    /// Field name already taken
    pub fn conflict(field: &str) -> Self {
        Self::new(
            SchemaErrorKind::Conflict,
            format!("The Field {} already exists.", field),
        )
    }

    /// Attempt to modify or delete a system-level field
    pub fn system_level_immutable(field: &str) -> Self {
        Self::new(
            SchemaErrorKind::BadInput,
            format!(
                "The Field {} is a System Level Field. You can't modify/delete a field which has System Level set as true",
                field
            ),
        )
    }

    /// `type` missing from a definition
    pub fn missing_type() -> Self {
        Self::new(
            SchemaErrorKind::BadInput,
            "The mandatory field \"type\" is not present",
        )
    }

    /// Caller tried to set `systemLevel`
    pub fn reserved_system_level() -> Self {
        Self::new(
            SchemaErrorKind::BadInput,
            "The field \"systemLevel\" is system level field and should not be used",
        )
    }

    /// `type` outside the whitelist
    pub fn invalid_type() -> Self {
        Self::new(SchemaErrorKind::BadInput, TYPE_HINT)
    }

    /// A flag that is neither a boolean nor a string
    pub fn invalid_flag(flag: &str) -> Self {
        Self::new(
            SchemaErrorKind::BadInput,
            format!("The field \"{}\" should be a boolean or \"true\"/\"false\"", flag),
        )
    }

    /// Field name that cannot be used as a record key
    pub fn invalid_field_name(field: &str) -> Self {
        Self::new(
            SchemaErrorKind::BadInput,
            format!(
                "The field name '{}' must start with a letter or underscore and contain only letters, digits, underscores and hyphens",
                field
            ),
        )
    }

    /// Persistence failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SchemaErrorKind::Internal, message)
    }

    /// Schema file could not be read or parsed
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorKind::Internal,
            format!("Malformed schema file '{}': {}", path.into(), reason.into()),
        )
    }

    pub fn kind(&self) -> SchemaErrorKind {
        self.kind
    }

    /// Returns the symbolic status string
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
