//! Error types for Meridian SDK operations.
//!
//! The REST call engine itself never surfaces transport or parse failures as
//! errors - those resolve to a normalized response (see
//! [`crate::response::ApiResponse`]). This type covers everything else:
//! configuration, session construction, and endpoint-level failures.

use thiserror::Error;

/// Main error type for Meridian SDK operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid endpoint URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for controller: {0}")]
    Timeout(String),

    /// Controller is unavailable
    #[error("Controller unavailable: {0}")]
    ServiceUnavailable(String),

    /// Failed to parse a controller response
    #[error("Failed to parse controller response: {0}")]
    ParseError(String),

    /// Login was rejected by the controller
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// Specialized result type for Meridian SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
