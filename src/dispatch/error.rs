use crate::backend::BackendError;
use crate::registry::RegistryError;
use crate::transcription::TranscriptionError;
use thiserror::Error;

/// Why an action failed; scoped to that action's response
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    /// Missing or invalid caller-supplied parameters
    #[error("{0}")]
    BadRequest(String),

    /// No action with this name
    #[error("Not Found")]
    UnknownAction(String),

    /// The referenced meeting (or its capture) does not exist
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The backend rejected the call or could not be reached
    #[error("{0}")]
    Backend(String),

    /// The backend did not answer in time; the caller may retry
    #[error("{0}")]
    BackendTimeout(String),

    /// Capture requested but no capture sink is configured
    #[error("Cloud media capture not available")]
    ConfigurationUnavailable,
}

impl From<BackendError> for DispatchError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout(_) => DispatchError::BackendTimeout(err.to_string()),
            other => DispatchError::Backend(other.to_string()),
        }
    }
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::MissingRegion | RegistryError::PrimaryNotFound(_) => {
                DispatchError::BadRequest(err.to_string())
            }
            RegistryError::MeetingNotFound(_) | RegistryError::NoActiveCapture(_) => {
                DispatchError::NotFound(err.to_string())
            }
            RegistryError::CaptureAlreadyActive(_) => DispatchError::Conflict(err.to_string()),
            RegistryError::CreationAborted => DispatchError::Backend(err.to_string()),
            RegistryError::Backend(backend) => backend.into(),
        }
    }
}

impl From<TranscriptionError> for DispatchError {
    fn from(err: TranscriptionError) -> Self {
        DispatchError::BadRequest(err.to_string())
    }
}
