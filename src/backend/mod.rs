//! Conferencing backend abstraction
//!
//! The broker never talks to the backend directly; every call goes through
//! [`ConferenceClient`]. Two variants of the backend API exist (legacy and
//! enhanced) and each meeting is pinned to one of them, see [`ClientVariant`].
//!
//! Transports:
//! - NATS request/reply to a backend bridge (`nats`)
//! - In-process fake backend for local runs and tests (`memory`)

mod error;
mod memory;
mod messages;
mod nats;
mod selection;
mod timeout;
mod types;

use crate::transcription::TranscriptionConfiguration;
use async_trait::async_trait;

pub use error::BackendError;
pub use memory::MemoryConferenceClient;
pub use messages::{AttendeeRef, BackendReply, CallerIdentity, MeetingRef, PipelineRef, StartTranscriptionRequest};
pub use nats::{connect as connect_nats, NatsConferenceClient, NatsIdentity};
pub use selection::{BackendClients, ClientVariant};
pub use timeout::TimeoutClient;
pub use types::{
    Attendee, AudioFeatures, CreateAttendeeRequest, CreateCapturePipelineRequest,
    CreateMeetingRequest, FeatureStatus, MediaCapturePipeline, Meeting, MeetingFeatures,
};

/// Backend operations, also used as NATS subject suffixes and call-count keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateMeeting,
    DeleteMeeting,
    CreateAttendee,
    DeleteAttendee,
    StartTranscription,
    StopTranscription,
    CreateCapturePipeline,
    DeleteCapturePipeline,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateMeeting => "create_meeting",
            Operation::DeleteMeeting => "delete_meeting",
            Operation::CreateAttendee => "create_attendee",
            Operation::DeleteAttendee => "delete_attendee",
            Operation::StartTranscription => "start_transcription",
            Operation::StopTranscription => "stop_transcription",
            Operation::CreateCapturePipeline => "create_capture_pipeline",
            Operation::DeleteCapturePipeline => "delete_capture_pipeline",
        }
    }
}

/// Conferencing backend client
///
/// Both backend variants implement this one interface; which instance a
/// meeting uses is decided by [`BackendClients`].
#[async_trait]
pub trait ConferenceClient: Send + Sync {
    async fn create_meeting(&self, request: CreateMeetingRequest) -> Result<Meeting, BackendError>;

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), BackendError>;

    async fn create_attendee(&self, request: CreateAttendeeRequest) -> Result<Attendee, BackendError>;

    async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> Result<(), BackendError>;

    async fn start_transcription(
        &self,
        meeting_id: &str,
        configuration: &TranscriptionConfiguration,
    ) -> Result<(), BackendError>;

    async fn stop_transcription(&self, meeting_id: &str) -> Result<(), BackendError>;

    async fn create_capture_pipeline(
        &self,
        request: CreateCapturePipelineRequest,
    ) -> Result<MediaCapturePipeline, BackendError>;

    async fn delete_capture_pipeline(&self, pipeline_id: &str) -> Result<(), BackendError>;

    /// Client name for logging
    fn name(&self) -> &str;
}

/// Resolves the account the broker acts as; needed to address capture sources
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn caller_account(&self) -> Result<String, BackendError>;
}

/// Fixed account id taken from configuration
pub struct StaticIdentity {
    account: String,
}

impl StaticIdentity {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn caller_account(&self) -> Result<String, BackendError> {
        Ok(self.account.clone())
    }
}
