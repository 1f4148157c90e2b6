use super::{
    Attendee, BackendError, ConferenceClient, CreateAttendeeRequest, CreateCapturePipelineRequest,
    CreateMeetingRequest, MediaCapturePipeline, Meeting, Operation,
};
use crate::transcription::TranscriptionConfiguration;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
struct HostedMeeting {
    meeting: Meeting,
    attendees: HashMap<String, Attendee>,
    transcription: Option<TranscriptionConfiguration>,
}

#[derive(Debug, Default)]
struct MemoryState {
    meetings: HashMap<String, HostedMeeting>,
    /// Idempotency token → meeting id
    tokens: HashMap<String, String>,
    pipelines: HashMap<String, MediaCapturePipeline>,
    calls: HashMap<Operation, usize>,
    /// One-shot injected failures
    failures: HashMap<Operation, String>,
}

/// In-process conferencing backend.
///
/// Behaves like the real service for everything the broker relies on
/// (id assignment, idempotent creation, attendee bookkeeping) and records
/// how often each operation was called.
pub struct MemoryConferenceClient {
    name: String,
    media_host: String,
    latency: Duration,
    state: Mutex<MemoryState>,
}

impl MemoryConferenceClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            media_host: "media.local".to_string(),
            latency: Duration::ZERO,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Delay applied to every call, used to widen race windows
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next call of `operation` fail with `message`
    pub async fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.failures.insert(operation, message.into());
    }

    pub async fn call_count(&self, operation: Operation) -> usize {
        let state = self.state.lock().await;
        state.calls.get(&operation).copied().unwrap_or(0)
    }

    pub async fn total_calls(&self) -> usize {
        let state = self.state.lock().await;
        state.calls.values().sum()
    }

    pub async fn meeting_count(&self) -> usize {
        self.state.lock().await.meetings.len()
    }

    pub async fn attendees(&self, meeting_id: &str) -> Vec<Attendee> {
        let state = self.state.lock().await;
        state
            .meetings
            .get(meeting_id)
            .map(|m| m.attendees.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn transcription(&self, meeting_id: &str) -> Option<TranscriptionConfiguration> {
        let state = self.state.lock().await;
        state
            .meetings
            .get(meeting_id)
            .and_then(|m| m.transcription.clone())
    }

    pub async fn pipeline_count(&self) -> usize {
        self.state.lock().await.pipelines.len()
    }

    /// Counts the call, applies latency and any injected failure
    async fn enter(&self, operation: Operation) -> Result<(), BackendError> {
        let failure = {
            let mut state = self.state.lock().await;
            *state.calls.entry(operation).or_insert(0) += 1;
            state.failures.remove(&operation)
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match failure {
            Some(message) => Err(BackendError::Service(message)),
            None => Ok(()),
        }
    }
}

fn meeting_not_found(meeting_id: &str) -> BackendError {
    BackendError::Service(format!("The meeting {} is not found", meeting_id))
}

#[async_trait]
impl ConferenceClient for MemoryConferenceClient {
    async fn create_meeting(&self, request: CreateMeetingRequest) -> Result<Meeting, BackendError> {
        self.enter(Operation::CreateMeeting).await?;

        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .tokens
            .get(&request.client_request_token)
            .and_then(|id| state.meetings.get(id))
        {
            return Ok(existing.meeting.clone());
        }

        if let Some(primary) = &request.primary_meeting_id {
            if !state.meetings.contains_key(primary) {
                return Err(meeting_not_found(primary));
            }
        }

        let meeting_id = Uuid::new_v4().to_string();
        let meeting = Meeting {
            meeting_id: meeting_id.clone(),
            external_meeting_id: Some(request.external_meeting_id),
            media_region: request.media_region.clone(),
            media_placement: Some(json!({
                "AudioHostUrl": format!("{}.{}:3478", meeting_id, self.media_host),
                "SignalingUrl": format!("wss://signal.{}.{}/control/{}", request.media_region, self.media_host, meeting_id),
            })),
            meeting_features: request.meeting_features,
            primary_meeting_id: request.primary_meeting_id,
        };

        info!("[{}] Created meeting {}", self.name, meeting_id);

        state
            .tokens
            .insert(request.client_request_token, meeting_id.clone());
        state.meetings.insert(
            meeting_id,
            HostedMeeting {
                meeting: meeting.clone(),
                attendees: HashMap::new(),
                transcription: None,
            },
        );

        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), BackendError> {
        self.enter(Operation::DeleteMeeting).await?;

        let mut state = self.state.lock().await;
        state
            .meetings
            .remove(meeting_id)
            .map(|_| ())
            .ok_or_else(|| meeting_not_found(meeting_id))
    }

    async fn create_attendee(&self, request: CreateAttendeeRequest) -> Result<Attendee, BackendError> {
        self.enter(Operation::CreateAttendee).await?;

        let mut state = self.state.lock().await;
        let hosted = state
            .meetings
            .get_mut(&request.meeting_id)
            .ok_or_else(|| meeting_not_found(&request.meeting_id))?;

        let attendee = Attendee {
            attendee_id: Uuid::new_v4().to_string(),
            external_user_id: request.external_user_id,
            join_token: Uuid::new_v4().simple().to_string(),
        };
        hosted
            .attendees
            .insert(attendee.attendee_id.clone(), attendee.clone());

        Ok(attendee)
    }

    async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> Result<(), BackendError> {
        self.enter(Operation::DeleteAttendee).await?;

        let mut state = self.state.lock().await;
        let hosted = state
            .meetings
            .get_mut(meeting_id)
            .ok_or_else(|| meeting_not_found(meeting_id))?;

        hosted
            .attendees
            .remove(attendee_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::Service(format!("The attendee {} is not found", attendee_id)))
    }

    async fn start_transcription(
        &self,
        meeting_id: &str,
        configuration: &TranscriptionConfiguration,
    ) -> Result<(), BackendError> {
        self.enter(Operation::StartTranscription).await?;

        let mut state = self.state.lock().await;
        let hosted = state
            .meetings
            .get_mut(meeting_id)
            .ok_or_else(|| meeting_not_found(meeting_id))?;
        hosted.transcription = Some(configuration.clone());
        Ok(())
    }

    async fn stop_transcription(&self, meeting_id: &str) -> Result<(), BackendError> {
        self.enter(Operation::StopTranscription).await?;

        let mut state = self.state.lock().await;
        let hosted = state
            .meetings
            .get_mut(meeting_id)
            .ok_or_else(|| meeting_not_found(meeting_id))?;
        hosted.transcription = None;
        Ok(())
    }

    async fn create_capture_pipeline(
        &self,
        request: CreateCapturePipelineRequest,
    ) -> Result<MediaCapturePipeline, BackendError> {
        self.enter(Operation::CreateCapturePipeline).await?;

        let pipeline = MediaCapturePipeline {
            media_pipeline_id: Uuid::new_v4().to_string(),
            source_type: request.source_type,
            source_arn: request.source_arn,
            sink_type: request.sink_type,
            sink_arn: request.sink_arn,
            status: Some("Initializing".to_string()),
        };

        let mut state = self.state.lock().await;
        state
            .pipelines
            .insert(pipeline.media_pipeline_id.clone(), pipeline.clone());

        Ok(pipeline)
    }

    async fn delete_capture_pipeline(&self, pipeline_id: &str) -> Result<(), BackendError> {
        self.enter(Operation::DeleteCapturePipeline).await?;

        let mut state = self.state.lock().await;
        state
            .pipelines
            .remove(pipeline_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::Service(format!("The pipeline {} is not found", pipeline_id)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
