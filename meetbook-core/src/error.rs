//! Error types for meetbook.

use thiserror::Error;

/// Errors that can occur talking to the meeting API or the local draft store.
#[derive(Error, Debug)]
pub enum MeetbookError {
    /// The request was rejected as invalid (4xx other than 404/409/412).
    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// The version token sent with the request is stale.
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Draft store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeetbookError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, MeetbookError::VersionConflict(_))
    }
}

impl From<reqwest::Error> for MeetbookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MeetbookError::Decode(err.to_string())
        } else {
            MeetbookError::Network(err.to_string())
        }
    }
}

/// Result type alias for meetbook operations.
pub type MeetbookResult<T> = Result<T, MeetbookError>;
