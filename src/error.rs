//! Error types and handling for the dispatch layer.
//!
//! Every failure the router can report is a configuration-time defect:
//! an unknown named middleware, a controller dependency nobody bound, a
//! constructor parameter the activator has no strategy for, or a malformed
//! route template. These abort setup. The only condition expected during
//! normal operation is [`ErrorKind::NoRouteMatched`], and the dispatcher
//! turns that into a not-found response rather than returning it.
//!
//! # Design
//!
//! This module uses an opaque `Error` struct paired with an `ErrorKind` enum,
//! following the `std::io::Error` pattern.
//!
//! # Example
//!
//! ```rust
//! use kiwi_dispatch::{Error, ErrorKind};
//!
//! let error = Error::unknown_middleware("auth");
//!
//! match error.kind() {
//!     ErrorKind::UnknownMiddleware => println!("fix your setup: {}", error),
//!     _ => println!("other error: {}", error),
//! }
//!
//! use axum::http::StatusCode;
//! assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
///
/// This enum is marked `#[non_exhaustive]`; always include a wildcard arm
/// when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A named middleware reference has no registration.
    #[error("unknown middleware")]
    UnknownMiddleware,

    /// A controller wants an interface with no bound implementation.
    #[error("unresolved dependency")]
    UnresolvedDependency,

    /// A controller constructor parameter has no resolution strategy.
    #[error("unresolvable parameter")]
    UnresolvableParameter,

    /// No route matched the request. Internal to dispatch.
    #[error("no route matched")]
    NoRouteMatched,

    /// A route template could not be compiled.
    #[error("invalid route pattern")]
    InvalidPattern,

    /// Configuration error (invalid TOML, missing values).
    #[error("configuration error")]
    Configuration,

    /// I/O error (file operations, network).
    #[error("I/O error")]
    Io,

    /// Invalid input (bad method name, header, request data).
    #[error("invalid input")]
    InvalidInput,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur while setting up or serving a router.
///
/// Use [`Error::kind()`] to determine the category of error for matching,
/// and the `Display` implementation to get a human-readable message.
///
/// ```rust
/// use kiwi_dispatch::{Error, ErrorKind};
///
/// let err = Error::invalid_pattern("/users/:", "empty parameter name");
/// assert_eq!(err.kind(), ErrorKind::InvalidPattern);
/// ```
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    ///
    /// ```rust
    /// use kiwi_dispatch::{Error, ErrorKind};
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

    /// Returns the error code string for this error.
    ///
    /// This is a stable identifier suitable for client-side error handling.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::UnknownMiddleware => "UNKNOWN_MIDDLEWARE",
            ErrorKind::UnresolvedDependency => "UNRESOLVED_DEPENDENCY",
            ErrorKind::UnresolvableParameter => "UNRESOLVABLE_PARAMETER",
            ErrorKind::NoRouteMatched => "NOT_FOUND",
            ErrorKind::InvalidPattern => "INVALID_PATTERN",
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::NoRouteMatched => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::UnknownMiddleware
            | ErrorKind::UnresolvedDependency
            | ErrorKind::UnresolvableParameter
            | ErrorKind::InvalidPattern
            | ErrorKind::Configuration
            | ErrorKind::Io
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
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
    /// Creates an unknown middleware error for the given name.
    pub fn unknown_middleware(name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::UnknownMiddleware,
            format!("Middleware '{}' not found.", name.as_ref()),
        )
    }

    /// Creates an unresolved dependency error.
    pub fn unresolved_dependency(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedDependency, msg.into())
    }

    /// Creates an unresolvable parameter error for a controller constructor.
    pub fn unresolvable_parameter(parameter: &str, controller: &str) -> Self {
        Self::new(
            ErrorKind::UnresolvableParameter,
            format!("Cannot resolve parameter '{parameter}' in '{controller}' constructor"),
        )
    }

    /// Creates a no-route-matched error.
    pub fn no_route_matched(method: &str, path: &str) -> Self {
        Self::new(
            ErrorKind::NoRouteMatched,
            format!("No route matched {method} {path}"),
        )
    }

    /// Creates an invalid pattern error for a route template.
    pub fn invalid_pattern(template: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidPattern,
            format!("Invalid route pattern '{template}': {reason}"),
        )
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
            "Error occurred"
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

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
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

// ============================================================================
// Tests
// ============================================================================
