//! Error Handling Module
//!
//! A single error type shared by the auth layer and the Vertex client.
//!
//! # Example
//!
//! ```rust,ignore
//! use vertex_imagen::error::LlmError;
//!
//! let error = LlmError::api_error(404, "Not found");
//! assert_eq!(error.status_code(), Some(404));
//! assert!(!error.is_auth_error());
//! ```

use thiserror::Error;

/// Errors produced by this crate.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Missing or invalid configuration (project, credentials file, headers...)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Credentials were found but did not yield a usable token
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-success response from the remote API
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A response body could not be interpreted
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("IO error: {0}")]
    IoError(String),

    /// Caller supplied an invalid request value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl LlmError {
    /// Build an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for credential problems and 401/403 responses.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::AuthenticationError(_) => true,
            Self::ApiError { code, .. } => matches!(code, 401 | 403),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for LlmError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
