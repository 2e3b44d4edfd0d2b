//! Error types for inbox synchronization
//!
//! Errors are classified by recoverability:
//! - Retryable: network failures, non-success HTTP status, malformed bodies,
//!   backend-reported failures
//! - NonRetryable: not-found, bad endpoint, configuration and IO errors

use thiserror::Error;

/// Error types for fetch and update operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    // Retryable errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Backend error: {0}")]
    Backend(String),

    // Non-retryable errors
    #[error("Resource not found")]
    NotFound,

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl SyncError {
    /// Returns true if a retry of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_)
                | SyncError::Status { .. }
                | SyncError::MalformedBody(_)
                | SyncError::Backend(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound)
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::Network(_) => "Check your internet connection and try again.",
            SyncError::Status { .. } => "The server had a problem. Try refreshing in a moment.",
            SyncError::MalformedBody(_) => "The server sent an unexpected response. Try again.",
            SyncError::Backend(_) => "The server could not complete the request. Try again.",
            SyncError::NotFound => "The inbox could not be found. Check the endpoint setting.",
            SyncError::InvalidEndpoint(_) => {
                "Check the endpoint URL in ~/.propdesk/config.json"
            }
            SyncError::Config(_) => "Check your configuration in ~/.propdesk/config.json",
            SyncError::Io(_) => "Check file permissions and try again.",
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedBody(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidEndpoint(err.to_string())
    }
}

/// Serializable error representation for the presentation layer
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorPayload {
    pub message: String,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

impl From<&SyncError> for SyncErrorPayload {
    fn from(err: &SyncError) -> Self {
        SyncErrorPayload {
            message: err.to_string(),
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
