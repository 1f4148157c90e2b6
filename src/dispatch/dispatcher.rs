use super::action::{Action, ActionStatus};
use super::error::DispatchError;
use super::params::Params;
use crate::backend::{CreateAttendeeRequest, CreateCapturePipelineRequest, IdentityProvider};
use crate::registry::{truncate_external_id, MeetingRegistry, MeetingRequest};
use crate::transcription::{build_configuration, TranscriptionOptions};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Successful action result
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    pub status: ActionStatus,
    pub body: Value,
}

/// Attendee external id: short random prefix plus the display name
pub fn attendee_external_id(name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    truncate_external_id(&format!("{}#{}", &token[..8], name))
}

/// Executes actions against the registry and the backend
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MeetingRegistry>,
    identity: Arc<dyn IdentityProvider>,
    capture_sink: Option<String>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<MeetingRegistry>,
        identity: Arc<dyn IdentityProvider>,
        capture_sink: Option<String>,
    ) -> Self {
        Self {
            registry,
            identity,
            capture_sink,
        }
    }

    pub fn registry(&self) -> &MeetingRegistry {
        &self.registry
    }

    /// Run the action called `name`.
    ///
    /// Unknown names and missing parameters are rejected before any
    /// registry or backend access.
    pub async fn dispatch(&self, name: &str, params: &Params) -> Result<ActionResponse, DispatchError> {
        let action =
            Action::from_name(name).ok_or_else(|| DispatchError::UnknownAction(name.to_string()))?;

        let missing = params.missing(action.required_params());
        if !missing.is_empty() {
            warn!("Rejected {}: missing {}", name, missing.join(", "));
            return Err(DispatchError::BadRequest(format!(
                "Need parameters: {}",
                missing.join(", ")
            )));
        }

        let body = match action {
            Action::Join => self.join(params).await,
            Action::End => self.end(params).await,
            Action::DeleteAttendee => self.delete_attendee(params).await,
            Action::StartCapture => self.start_capture(params).await,
            Action::EndCapture => self.end_capture(params).await,
            Action::StartTranscription => self.start_transcription(params).await,
            Action::StopTranscription => self.stop_transcription(params).await,
        }
        .map_err(|e| {
            match &e {
                DispatchError::Backend(_) | DispatchError::BackendTimeout(_) => {
                    error!("{} failed: {}", name, e)
                }
                _ => warn!("{} rejected: {}", name, e),
            }
            e
        })?;

        Ok(ActionResponse {
            status: action.success_status(),
            body,
        })
    }

    async fn join(&self, params: &Params) -> Result<Value, DispatchError> {
        let title = params.require("title")?;
        let name = params.require("name")?;

        let request = MeetingRequest {
            media_region: params.get("region").map(str::to_string),
            echo_reduction: params.get("ns_es") == Some("true"),
            primary_title: params.get("primaryExternalMeetingId").map(str::to_string),
        };

        let record = self.registry.get_or_create(title, request).await?;
        let client = self.registry.clients().for_meeting(&record);

        let attendee = client
            .create_attendee(CreateAttendeeRequest {
                meeting_id: record.meeting_id().to_string(),
                external_user_id: attendee_external_id(name),
            })
            .await?;

        info!(
            "Attendee {} joined meeting '{}' ({})",
            attendee.attendee_id,
            title,
            record.meeting_id()
        );

        let mut join_info = json!({
            "Meeting": { "Meeting": record.meeting },
            "Attendee": { "Attendee": attendee },
        });
        if let (Some(primary), Some(info)) =
            (&record.primary_external_meeting_id, join_info.as_object_mut())
        {
            info.insert(
                "PrimaryExternalMeetingId".to_string(),
                Value::String(primary.clone()),
            );
        }

        Ok(json!({ "JoinInfo": join_info }))
    }

    async fn end(&self, params: &Params) -> Result<Value, DispatchError> {
        let title = params.require("title")?;
        let record = self.registry.get(title).await?;

        self.registry
            .clients()
            .for_meeting(&record)
            .delete_meeting(record.meeting_id())
            .await?;

        // A meeting re-created under the title meanwhile is not ours to drop
        self.registry.remove_meeting(title, record.meeting_id()).await;
        info!("Ended meeting '{}' ({})", title, record.meeting_id());

        Ok(json!({}))
    }

    async fn delete_attendee(&self, params: &Params) -> Result<Value, DispatchError> {
        let title = params.require("title")?;
        let attendee_id = params.require("attendeeId")?;
        let record = self.registry.get(title).await?;

        self.registry
            .clients()
            .for_meeting(&record)
            .delete_attendee(record.meeting_id(), attendee_id)
            .await?;

        info!("Deleted attendee {} from meeting '{}'", attendee_id, title);
        Ok(json!({}))
    }

    fn require_capture_sink(&self) -> Result<&str, DispatchError> {
        self.capture_sink.as_deref().ok_or_else(|| {
            warn!("Cloud media capture not available");
            DispatchError::ConfigurationUnavailable
        })
    }

    async fn start_capture(&self, params: &Params) -> Result<Value, DispatchError> {
        let sink = self.require_capture_sink()?;
        let title = params.require("title")?;
        let record = self.registry.get(title).await?;

        if record.capture.is_some() {
            return Err(DispatchError::Conflict(format!(
                "Capture already active for meeting: {}",
                title
            )));
        }

        let account = self.identity.caller_account().await?;
        let source_arn = format!("arn:aws:chime::{}:meeting:{}", account, record.meeting_id());
        let client = self.registry.clients().for_meeting(&record);

        let pipeline = client
            .create_capture_pipeline(CreateCapturePipelineRequest::meeting_to_bucket(
                source_arn, sink,
            ))
            .await?;

        // Lost a race with another startCapture, or the meeting ended (and may
        // have been re-created): don't leave the new pipeline running unowned.
        if let Err(e) = self
            .registry
            .attach_capture(title, record.meeting_id(), pipeline.clone())
            .await
        {
            if let Err(cleanup) = client
                .delete_capture_pipeline(&pipeline.media_pipeline_id)
                .await
            {
                error!(
                    "Failed to delete orphaned pipeline {}: {}",
                    pipeline.media_pipeline_id, cleanup
                );
            }
            return Err(e.into());
        }

        info!(
            "Started capture {} for meeting '{}'",
            pipeline.media_pipeline_id, title
        );
        Ok(json!({ "MediaCapturePipeline": pipeline }))
    }

    async fn end_capture(&self, params: &Params) -> Result<Value, DispatchError> {
        self.require_capture_sink()?;
        let title = params.require("title")?;
        let record = self.registry.get(title).await?;
        let pipeline = self
            .registry
            .detach_capture(title, record.meeting_id())
            .await?;

        let deleted = self
            .registry
            .clients()
            .for_meeting(&record)
            .delete_capture_pipeline(&pipeline.media_pipeline_id)
            .await;

        if let Err(e) = deleted {
            // Pipeline is still running; keep the handle on the meeting
            if let Err(reattach) = self
                .registry
                .attach_capture(title, record.meeting_id(), pipeline)
                .await
            {
                warn!("Could not restore capture handle on '{}': {}", title, reattach);
            }
            return Err(e.into());
        }

        info!(
            "Ended capture {} for meeting '{}'",
            pipeline.media_pipeline_id, title
        );
        Ok(json!({}))
    }

    async fn start_transcription(&self, params: &Params) -> Result<Value, DispatchError> {
        let title = params.require("title")?;
        let engine = params.require("engine")?;

        let mut stream_params =
            TranscriptionOptions::parse_stream_params(params.get("transcriptionStreamParams"))?;
        if let Some(content_identification) = params.get("contentIdentification") {
            stream_params
                .entry("contentIdentificationType")
                .or_insert_with(|| Value::String(content_identification.to_string()));
        }
        if let Some(pii_entity_types) = params.get("piiEntityTypes") {
            stream_params
                .entry("piiEntityTypes")
                .or_insert_with(|| Value::String(pii_entity_types.to_string()));
        }

        let options = TranscriptionOptions {
            language_code: params.get("language").map(str::to_string),
            region: params.get("region").map(str::to_string),
            stream_params,
        };
        let configuration = build_configuration(engine, &options)?;

        let record = self.registry.get(title).await?;
        self.registry
            .clients()
            .for_meeting(&record)
            .start_transcription(record.meeting_id(), &configuration)
            .await?;

        info!(
            "Started {} transcription for meeting '{}'",
            configuration.engine().as_str(),
            title
        );
        Ok(json!({}))
    }

    async fn stop_transcription(&self, params: &Params) -> Result<Value, DispatchError> {
        let title = params.require("title")?;
        let record = self.registry.get(title).await?;

        self.registry
            .clients()
            .for_meeting(&record)
            .stop_transcription(record.meeting_id())
            .await?;

        info!("Stopped transcription for meeting '{}'", title);
        Ok(json!({}))
    }
}
