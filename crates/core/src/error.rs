//! Structured error handling with codes, context and recovery suggestions
//!
//! Every failure surfaced by apkforge carries:
//! - An error code for programmatic handling
//! - The field path, rule name or coordinate that caused it
//! - An optional recovery suggestion
//! - A serializable report form for `--json` output

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    Internal = 1001,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    // Descriptor errors (3xxx)
    MalformedDescriptor = 3001,
    UnsupportedFormat = 3002,

    // Tool configuration errors (4xxx)
    ConfigError = 4000,
    ConfigNotFound = 4001,
    ConfigParseError = 4002,

    // Validation errors (6xxx)
    ConstraintViolation = 6003,

    // Dependency errors (7xxx)
    VersionConflict = 7001,
    CatalogError = 7002,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Descriptor",
            4 => "Configuration",
            6 => "Validation",
            7 => "Dependency",
            _ => "Unknown",
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedDescriptor | Self::UnsupportedFormat => exit_codes::MALFORMED_DESCRIPTOR,
            Self::ConstraintViolation => exit_codes::CONSTRAINT_VIOLATION,
            Self::VersionConflict => exit_codes::VERSION_CONFLICT,
            _ => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check that the file exists and you have read permissions")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create an apkforge.toml file or use --config to specify a path")
    }

    pub fn config_parse(path: impl AsRef<std::path::Path>, err: toml::de::Error) -> Self {
        Self::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}", path.as_ref().display()),
        )
        .with_source(err)
    }

    pub fn malformed(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MalformedDescriptor,
            format!("Malformed descriptor at `{}`: {}", path, reason),
        )
        .with_suggestion("Fix the field in the descriptor file and re-run")
    }

    pub fn unsupported_format(format: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedFormat,
            format!("Unsupported descriptor format: {}", format),
        )
        .with_suggestion("Use a .toml, .json or .gradle descriptor, or pass --format")
    }

    pub fn constraint_violation(rule: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConstraintViolation,
            format!("Constraint violated: {} ({})", rule, detail),
        )
    }

    pub fn version_conflict(coordinate: impl fmt::Display, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::VersionConflict,
            format!("Version conflict for {}: {}", coordinate, detail),
        )
        .with_suggestion("Pin a single explicit version or declare a platform(...) BOM for the group")
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CatalogError, message)
    }
}

/// Serializable error report for logging and `--json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub code_str: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const MALFORMED_DESCRIPTOR: i32 = 2;
    pub const CONSTRAINT_VIOLATION: i32 = 3;
    pub const VERSION_CONFLICT: i32 = 4;
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(
            ErrorCode::MalformedDescriptor,
            format!("JSON parse error: {}", err),
        )
        .with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(
            ErrorCode::MalformedDescriptor,
            format!("TOML parse error: {}", err),
        )
        .with_source(err)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::new(ErrorCode::Internal, format!("TOML write error: {}", err)).with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::VersionConflict.to_string(), "E7001");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::MalformedDescriptor.category(), "Descriptor");
        assert_eq!(ErrorCode::ConstraintViolation.category(), "Validation");
        assert_eq!(ErrorCode::VersionConflict.category(), "Dependency");
        assert_eq!(ErrorCode::ConfigParseError.category(), "Configuration");
    }

    #[test]
    fn test_exit_codes_per_failure_kind() {
        assert_eq!(
            Error::malformed("android.compileSdk", "missing").exit_code(),
            exit_codes::MALFORMED_DESCRIPTOR
        );
        assert_eq!(
            Error::constraint_violation("minSdk<=targetSdk", "36 > 35").exit_code(),
            exit_codes::CONSTRAINT_VIOLATION
        );
        assert_eq!(
            Error::version_conflict("g:a", "1.0 vs 2.0").exit_code(),
            exit_codes::VERSION_CONFLICT
        );
        assert_eq!(Error::io("disk").exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::file_not_found("/path/to/app.toml").with_context("While loading descriptor");

        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_malformed_message_names_field_path() {
        let err = Error::malformed("android.defaultConfig.minSdk", "expected an integer");
        assert!(err.message.contains("android.defaultConfig.minSdk"));
    }

    #[test]
    fn test_error_report_serialization() {
        let err = Error::version_conflict("com.example:lib", "1.0 vs 2.0")
            .with_context("Resolving dependencies");

        let report = err.to_report();
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("E7001"));
        assert!(json.contains("Dependency"));
        assert!(json.contains("com.example:lib"));
    }
}
