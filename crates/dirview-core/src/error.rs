//! Error types for directory operations.
//!
//! The taxonomy follows the stages of a directory call: dialing the server, binding, searching a
//! container, and the configuration that has to be valid before any of those can run.

use serde::Serialize;
use thiserror::Error;

/// Main error type for directory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The directory server could not be reached (dial failure or dial timeout).
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// The server rejected the anonymous bind.
    #[error("bind error: {0}")]
    BindError(String),

    /// A subtree search failed.
    #[error("search error in OU {container}: {message}")]
    SearchError {
        /// Container (organizational unit) being searched
        container: String,
        /// Underlying cause
        message: String,
    },

    /// Configuration error (malformed port, endpoint, or out-of-range settings)
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A distinguished name could not be parsed
    #[error("invalid distinguished name: {0}")]
    InvalidDn(String),

    /// The caller supplied an unusable request
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Specialized result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl Error {
    /// Wraps any failure raised while searching `container`.
    #[must_use]
    pub fn search(container: impl Into<String>, cause: impl ToString) -> Self {
        Self::SearchError {
            container: container.into(),
            message: cause.to_string(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionError(_) => "CONNECTION_ERROR",
            Self::BindError(_) => "BIND_ERROR",
            Self::SearchError { .. } => "SEARCH_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidDn(_) => "INVALID_DN",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        }
    }

    /// Returns true if this error reflects an operational failure worth logging.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_)
                | Self::BindError(_)
                | Self::SearchError { .. }
                | Self::ConfigError(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid endpoint: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::ConfigError(format!("invalid port format: {err}"))
    }
}
