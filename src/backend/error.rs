use std::time::Duration;
use thiserror::Error;

/// Failure of a call against the conferencing backend.
///
/// `Clone` so a single failed meeting creation can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The call did not complete within the configured bound. Safe to retry.
    #[error("backend request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend received the call and rejected it.
    #[error("{0}")]
    Service(String),

    /// The call never reached the backend or its reply was unreadable.
    #[error("backend transport error: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Timeout(_) | BackendError::Transport(_))
    }
}
