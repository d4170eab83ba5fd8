//! Error types for route declaration, mounting and dispatch.
//!
//! Setup-time failures (bad patterns, malformed mounts, invalid configuration)
//! are reported through this module and are expected to abort startup. Errors
//! raised inside a handler are never wrapped here; they travel through the
//! chain untouched and the transport decides what to answer.
//!
//! # Design
//!
//! This module uses an opaque `Error` struct paired with an `ErrorKind` enum,
//! following the `std::io::Error` pattern, so internal error sources can change
//! without breaking consumers.
//!
//! # Example
//!
//! ```rust
//! use axum_dispatch::{Error, ErrorKind, Router};
//!
//! let mut router = Router::new();
//! let err = router.get("/users/:id(\\d+", []).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Pattern);
//!
//! let err = Error::type_mismatch("base route must start with '/'");
//! assert_eq!(err.error_code(), "TYPE_MISMATCH");
//! ```

use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde::Serialize,
    std::fmt,
    thiserror::Error,
};

/// The kind of error that occurred.
///
/// This enum is marked `#[non_exhaustive]`, so new variants may be added
/// in future versions without breaking existing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed path pattern (unbalanced groups, duplicate names, bad regex).
    #[error("pattern error")]
    Pattern,

    /// Wrong shape passed to `use`/`mount`, such as a malformed base route.
    #[error("type mismatch")]
    TypeMismatch,

    /// A router was asked to resolve a path before being activated.
    #[error("router not activated")]
    NotActivated,

    /// Configuration error (invalid TOML, missing values).
    #[error("configuration error")]
    Configuration,

    /// I/O error (file operations, network).
    #[error("I/O error")]
    Io,

    /// Invalid input (bad header name or value).
    #[error("invalid input")]
    InvalidInput,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur while building or running a dispatcher.
///
/// Use [`Error::kind()`] to determine the category of error for matching,
/// and the `Display` implementation to get a human-readable message.
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    ///
    /// ```rust
    /// use axum_dispatch::{Error, ErrorKind};
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
            source: error.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns a stable error code string suitable for client-side handling.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Pattern => "PATTERN_ERROR",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::NotActivated => "NOT_ACTIVATED",
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into a structured error response.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.error_code(), self.to_string())
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
    /// Creates a pattern error.
    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Pattern, msg.into())
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, msg.into())
    }

    /// Creates an error for a router used before `activate()`.
    pub fn not_activated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotActivated, msg.into())
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates an I/O error from a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
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

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        tracing::error!(
            error_code = %error_response.error_code,
            message = %error_response.message,
            status = %status.as_u16(),
            "Dispatch error"
        );

        (status, Json(error_response)).into_response()
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

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// Structured error response with error code and details.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Unique error code for client-side error handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
