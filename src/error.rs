//! Error types and handling for the configuration engine.
//!
//! Every hard failure surfaces as a single [`Error`] carrying one human-readable
//! message, taken verbatim from the violated constraint. The caller (usually
//! middleware startup code) is expected to abort initialization.
//!
//! # Design
//!
//! This module uses an opaque `Error` struct paired with an `ErrorKind` enum,
//! following the `std::io::Error` pattern. This design provides API stability:
//! internal error sources can change without breaking consumers.
//!
//! # Example
//!
//! ```rust
//! use oidc_conf::{Error, ErrorKind};
//!
//! let error = Error::missing("baseURL", "\"baseURL\" is required");
//!
//! match error.kind() {
//!     ErrorKind::MissingRequiredField => println!("Missing: {}", error),
//!     ErrorKind::TypeMismatch => println!("Wrong type: {}", error),
//!     _ => println!("Other error: {}", error),
//! }
//!
//! assert_eq!(error.field(), Some("baseURL"));
//! assert_eq!(error.error_code(), "MISSING_REQUIRED_FIELD");
//! ```

use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
///
/// This enum categorizes errors for matching purposes. Use `Error::kind()`
/// to get the kind of an error.
///
/// # Stability
///
/// This enum is marked `#[non_exhaustive]`, so new variants may be added
/// in future versions without breaking existing code. Always include a
/// wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required field is absent, either unconditionally or because
    /// another field made it required.
    #[error("missing required field")]
    MissingRequiredField,

    /// A field holds a value of the wrong type.
    #[error("type mismatch")]
    TypeMismatch,

    /// A field violates a static constraint (pattern, URI shape, range, enum).
    #[error("format violation")]
    FormatViolation,

    /// A combination of otherwise valid field values is disallowed.
    #[error("cross-field constraint violation")]
    CrossFieldConstraint,

    /// Input that cannot be read as a configuration mapping (invalid TOML/JSON).
    #[error("configuration error")]
    Configuration,

    /// I/O error while reading a configuration file.
    #[error("I/O error")]
    Io,

    /// The constraint graph itself is malformed (dangling reference, cycle).
    #[error("schema error")]
    Schema,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur while normalizing a configuration.
///
/// This is an opaque error type that wraps an underlying error source.
/// Use [`Error::kind()`] to determine the category of error for matching,
/// [`Error::field()`] to find the offending field, and the `Display`
/// implementation to get the human-readable message.
///
/// # Creating Errors
///
/// ```rust
/// use oidc_conf::Error;
///
/// let err = Error::config("root must be a table");
/// let err = Error::internal("unexpected state");
/// ```
pub struct Error {
    kind: ErrorKind,
    field: Option<String>,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oidc_conf::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::Internal, "something went wrong");
    /// assert_eq!(err.kind(), ErrorKind::Internal);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            field: None,
            source: error.into(),
        }
    }

    /// Attaches the dotted path of the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the dotted path of the field that caused this error, if any.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the error code string for this error.
    ///
    /// This is a stable identifier suitable for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::FormatViolation => "FORMAT_VIOLATION",
            ErrorKind::CrossFieldConstraint => "CROSS_FIELD_CONSTRAINT",
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Schema => "SCHEMA_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns true for the four kinds produced by field validation.
    pub fn is_violation(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MissingRequiredField
                | ErrorKind::TypeMismatch
                | ErrorKind::FormatViolation
                | ErrorKind::CrossFieldConstraint
        )
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    /// Creates a missing required field error.
    pub fn missing(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingRequiredField, msg.into()).with_field(field)
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, msg.into()).with_field(field)
    }

    /// Creates a format violation error.
    pub fn format(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::FormatViolation, msg.into()).with_field(field)
    }

    /// Creates a cross-field constraint violation error.
    pub fn cross_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CrossFieldConstraint, msg.into()).with_field(field)
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates a schema construction error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("field", &self.field)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            format!("{}", ErrorKind::MissingRequiredField),
            "missing required field"
        );
        assert_eq!(
            format!("{}", ErrorKind::CrossFieldConstraint),
            "cross-field constraint violation"
        );
        assert_eq!(format!("{}", ErrorKind::Internal), "internal error");
    }

    #[test]
    fn test_error_new() {
        let err = Error::new(ErrorKind::Internal, "test error");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.field(), None);
        assert_eq!(format!("{}", err), "test error");
    }

    #[test]
    fn test_violation_constructors_carry_field() {
        let err = Error::missing("clientID", "\"clientID\" is required");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert_eq!(err.field(), Some("clientID"));
        assert!(err.is_violation());

        let err = Error::type_mismatch("session.rolling", "\"session.rolling\" must be a boolean");
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = Error::format("session.name", "bad name");
        assert_eq!(err.kind(), ErrorKind::FormatViolation);

        let err = Error::cross_field("clientAuthMethod", "nope");
        assert_eq!(err.kind(), ErrorKind::CrossFieldConstraint);
        assert_eq!(err.field(), Some("clientAuthMethod"));
    }

    #[test]
    fn test_non_violation_kinds() {
        assert!(!Error::config("x").is_violation());
        assert!(!Error::schema("x").is_violation());
        assert!(!Error::internal("x").is_violation());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::missing("a", "m").error_code(), "MISSING_REQUIRED_FIELD");
        assert_eq!(Error::type_mismatch("a", "m").error_code(), "TYPE_MISMATCH");
        assert_eq!(Error::format("a", "m").error_code(), "FORMAT_VIOLATION");
        assert_eq!(Error::cross_field("a", "m").error_code(), "CROSS_FIELD_CONSTRAINT");
        assert_eq!(Error::config("m").error_code(), "CONFIG_ERROR");
        assert_eq!(Error::schema("m").error_code(), "SCHEMA_ERROR");
        assert_eq!(Error::internal("m").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_from_toml_error() {
        let toml_err = "invalid".parse::<toml::Table>().unwrap_err();
        let err: Error = toml_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_error_debug() {
        let err = Error::missing("baseURL", "test");
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("MissingRequiredField"));
        assert!(debug_str.contains("baseURL"));
    }

    #[test]
    fn test_error_into_inner() {
        let err = Error::internal("test message");
        let inner = err.into_inner();
        assert_eq!(format!("{}", inner), "test message");
    }

    #[test]
    fn test_error_source_trait() {
        let err = Error::internal("test");
        assert!(StdError::source(&err).is_some());
    }
}
