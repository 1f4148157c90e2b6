use super::messages::{
    AttendeeRef, BackendReply, CallerIdentity, MeetingRef, PipelineRef, StartTranscriptionRequest,
};
use super::{
    Attendee, BackendError, ClientVariant, ConferenceClient, CreateAttendeeRequest,
    CreateCapturePipelineRequest, CreateMeetingRequest, IdentityProvider, MediaCapturePipeline,
    Meeting, Operation,
};
use crate::transcription::TranscriptionConfiguration;
use anyhow::{Context, Result};
use async_nats::Client;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

/// Connect to the NATS server fronting the backend bridge
pub async fn connect(url: &str) -> Result<Client> {
    info!("Connecting to NATS at {}", url);

    let client = async_nats::connect(url)
        .await
        .context("Failed to connect to NATS")?;

    info!("Connected to NATS successfully");

    Ok(client)
}

/// Sends one request and decodes the bridge's reply envelope
async fn request<Req, Resp>(
    client: &Client,
    subject: String,
    body: &Req,
) -> Result<Option<Resp>, BackendError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let payload = serde_json::to_vec(body).map_err(|e| BackendError::Transport(e.to_string()))?;

    debug!("Requesting {} ({} bytes)", subject, payload.len());

    let reply = client
        .request(subject.clone(), payload.into())
        .await
        .map_err(|e| BackendError::Transport(format!("{}: {}", subject, e)))?;

    let reply: BackendReply<Resp> = serde_json::from_slice(&reply.payload)
        .map_err(|e| BackendError::Transport(format!("malformed reply on {}: {}", subject, e)))?;

    match reply.error {
        Some(message) => Err(BackendError::Service(message)),
        None => Ok(reply.result),
    }
}

/// Backend client speaking request/reply over NATS.
///
/// Subjects are `<prefix>.<variant>.<operation>`, e.g.
/// `conference.enhanced.create_meeting`.
pub struct NatsConferenceClient {
    client: Client,
    subject_prefix: String,
    name: String,
}

impl NatsConferenceClient {
    pub fn new(client: Client, prefix: &str, variant: ClientVariant) -> Self {
        Self {
            client,
            subject_prefix: format!("{}.{}", prefix, variant.as_str()),
            name: format!("nats-{}", variant.as_str()),
        }
    }

    fn subject(&self, operation: Operation) -> String {
        format!("{}.{}", self.subject_prefix, operation.as_str())
    }

    async fn call<Req, Resp>(&self, operation: Operation, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        request(&self.client, self.subject(operation), body)
            .await?
            .ok_or_else(|| {
                BackendError::Transport(format!("empty reply to {}", operation.as_str()))
            })
    }

    async fn call_unit<Req>(&self, operation: Operation, body: &Req) -> Result<(), BackendError>
    where
        Req: Serialize + ?Sized,
    {
        request::<Req, serde_json::Value>(&self.client, self.subject(operation), body).await?;
        Ok(())
    }
}

#[async_trait]
impl ConferenceClient for NatsConferenceClient {
    async fn create_meeting(&self, request: CreateMeetingRequest) -> Result<Meeting, BackendError> {
        self.call(Operation::CreateMeeting, &request).await
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), BackendError> {
        let body = MeetingRef {
            meeting_id: meeting_id.to_string(),
        };
        self.call_unit(Operation::DeleteMeeting, &body).await
    }

    async fn create_attendee(&self, request: CreateAttendeeRequest) -> Result<Attendee, BackendError> {
        self.call(Operation::CreateAttendee, &request).await
    }

    async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> Result<(), BackendError> {
        let body = AttendeeRef {
            meeting_id: meeting_id.to_string(),
            attendee_id: attendee_id.to_string(),
        };
        self.call_unit(Operation::DeleteAttendee, &body).await
    }

    async fn start_transcription(
        &self,
        meeting_id: &str,
        configuration: &TranscriptionConfiguration,
    ) -> Result<(), BackendError> {
        let body = StartTranscriptionRequest {
            meeting_id: meeting_id.to_string(),
            transcription_configuration: configuration.clone(),
        };
        self.call_unit(Operation::StartTranscription, &body).await
    }

    async fn stop_transcription(&self, meeting_id: &str) -> Result<(), BackendError> {
        let body = MeetingRef {
            meeting_id: meeting_id.to_string(),
        };
        self.call_unit(Operation::StopTranscription, &body).await
    }

    async fn create_capture_pipeline(
        &self,
        request: CreateCapturePipelineRequest,
    ) -> Result<MediaCapturePipeline, BackendError> {
        self.call(Operation::CreateCapturePipeline, &request).await
    }

    async fn delete_capture_pipeline(&self, pipeline_id: &str) -> Result<(), BackendError> {
        let body = PipelineRef {
            media_pipeline_id: pipeline_id.to_string(),
        };
        self.call_unit(Operation::DeleteCapturePipeline, &body).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Resolves the caller account through `<prefix>.identity.caller`
pub struct NatsIdentity {
    client: Client,
    subject: String,
}

impl NatsIdentity {
    pub fn new(client: Client, prefix: &str) -> Self {
        Self {
            client,
            subject: format!("{}.identity.caller", prefix),
        }
    }
}

#[async_trait]
impl IdentityProvider for NatsIdentity {
    async fn caller_account(&self) -> Result<String, BackendError> {
        let identity: Option<CallerIdentity> =
            request(&self.client, self.subject.clone(), &serde_json::json!({})).await?;

        identity
            .map(|id| id.account)
            .ok_or_else(|| BackendError::Transport("empty identity reply".to_string()))
    }
}
