//! Error types shared by the lookup engine

use thiserror::Error;

/// Failure of a single remote read. Never retried by the source itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status: {0}")]
    Status(u16),
    #[error("unexpected response structure: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Recoverable outcome of a navigation step. Each variant renders as a
/// message to the session that caused it and leaves every other state as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0} not found in lending list")]
    NotFound(String),
    #[error("history is not available for {0}")]
    Unsupported(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
