use super::{
    Attendee, BackendError, ConferenceClient, CreateAttendeeRequest, CreateCapturePipelineRequest,
    CreateMeetingRequest, MediaCapturePipeline, Meeting,
};
use crate::transcription::TranscriptionConfiguration;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bounds every call of the wrapped client.
///
/// Expiry surfaces as [`BackendError::Timeout`], which callers may retry.
pub struct TimeoutClient {
    inner: Arc<dyn ConferenceClient>,
    limit: Duration,
}

impl TimeoutClient {
    pub fn new(inner: Arc<dyn ConferenceClient>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T: Send>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, BackendError>> + Send,
    ) -> Result<T, BackendError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} via {} timed out after {:?}",
                    operation,
                    self.inner.name(),
                    self.limit
                );
                Err(BackendError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl ConferenceClient for TimeoutClient {
    async fn create_meeting(&self, request: CreateMeetingRequest) -> Result<Meeting, BackendError> {
        self.bounded("create_meeting", self.inner.create_meeting(request))
            .await
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), BackendError> {
        self.bounded("delete_meeting", self.inner.delete_meeting(meeting_id))
            .await
    }

    async fn create_attendee(&self, request: CreateAttendeeRequest) -> Result<Attendee, BackendError> {
        self.bounded("create_attendee", self.inner.create_attendee(request))
            .await
    }

    async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> Result<(), BackendError> {
        self.bounded(
            "delete_attendee",
            self.inner.delete_attendee(meeting_id, attendee_id),
        )
        .await
    }

    async fn start_transcription(
        &self,
        meeting_id: &str,
        configuration: &TranscriptionConfiguration,
    ) -> Result<(), BackendError> {
        self.bounded(
            "start_transcription",
            self.inner.start_transcription(meeting_id, configuration),
        )
        .await
    }

    async fn stop_transcription(&self, meeting_id: &str) -> Result<(), BackendError> {
        self.bounded("stop_transcription", self.inner.stop_transcription(meeting_id))
            .await
    }

    async fn create_capture_pipeline(
        &self,
        request: CreateCapturePipelineRequest,
    ) -> Result<MediaCapturePipeline, BackendError> {
        self.bounded(
            "create_capture_pipeline",
            self.inner.create_capture_pipeline(request),
        )
        .await
    }

    async fn delete_capture_pipeline(&self, pipeline_id: &str) -> Result<(), BackendError> {
        self.bounded(
            "delete_capture_pipeline",
            self.inner.delete_capture_pipeline(pipeline_id),
        )
        .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
