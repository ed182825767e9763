//! CLI-specific error types
//!
//! Every CLI error ends the process with exit code 1.

use std::fmt;
use std::io;

use crate::records::RecordError;
use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Filesystem error
    IoError,
    /// Schema file already present
    AlreadyInitialized,
    /// Schema file missing
    NotInitialized,
    /// Schema or record storage could not be opened
    BootFailed,
    /// Server stopped with an error
    ServeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DYNA_CLI_CONFIG_ERROR",
            Self::IoError => "DYNA_CLI_IO_ERROR",
            Self::AlreadyInitialized => "DYNA_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "DYNA_CLI_NOT_INITIALIZED",
            Self::BootFailed => "DYNA_CLI_BOOT_FAILED",
            Self::ServeFailed => "DYNA_CLI_SERVE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(path: &str) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Schema file '{}' already exists", path),
        )
    }

    pub fn not_initialized(path: &str) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!(
                "Schema file '{}' not found. Run 'dynaschema init' first.",
                path
            ),
        )
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

impl From<RecordError> for CliError {
    fn from(e: RecordError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_code_prefix() {
        let err = CliError::config_error("missing data_dir");
        assert_eq!(err.to_string(), "DYNA_CLI_CONFIG_ERROR: missing data_dir");
    }

    #[test]
    fn test_schema_errors_fail_boot() {
        let err = CliError::from(SchemaError::internal("disk"));
        assert_eq!(err.code(), &CliErrorCode::BootFailed);
        assert!(err.message().contains("disk"));
    }
}
