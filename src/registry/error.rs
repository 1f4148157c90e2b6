use crate::backend::BackendError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Need region parameter set if meeting has not yet been created")]
    MissingRegion,

    #[error("Primary meeting has not been created: {0}")]
    PrimaryNotFound(String),

    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("Capture already active for meeting: {0}")]
    CaptureAlreadyActive(String),

    #[error("No active capture for meeting: {0}")]
    NoActiveCapture(String),

    /// The task creating the meeting went away without reporting back
    #[error("Meeting creation aborted")]
    CreationAborted,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
