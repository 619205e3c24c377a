//! Advisor error types.

use thiserror::Error;

/// Advisor errors.
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status
    #[error("Advisor gateway returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error text from the body, or the raw body
        message: String,
    },

    /// Gateway answered `{"error": ..}`
    #[error("Advisor gateway error: {0}")]
    Gateway(String),

    /// Reply text did not have the expected shape
    #[error("Malformed advisor reply: {0}")]
    MalformedReply(String),

    /// Command reply named an action or target outside the vocabulary
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for advisor operations.
pub type Result<T> = std::result::Result<T, AdvisorError>;
