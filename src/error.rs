//! Error types for the Gemini image MCP server.
//!
//! A single `thiserror` hierarchy covering every failure mode of a tool call:
//!
//! - `Error::Api`: remote API errors (includes endpoint and HTTP status)
//! - `Error::Validation`: input validation failures
//! - `Error::Io`: file system operations
//!
//! Every error is terminal for the invocation it occurs in; there is no
//! retry or partial-success path.

use thiserror::Error;

/// Unified error type for tool operations.
#[derive(Debug, Error)]
pub enum Error {
    /// API errors with endpoint and HTTP status context.
    ///
    /// Covers non-success responses (carrying the raw body text), unparsable
    /// response bodies, and responses that contain no image data.
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new API error with endpoint, status code, and message.
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// True if this is a caller-input problem rather than a server-side one.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;
