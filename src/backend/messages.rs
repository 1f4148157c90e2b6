use crate::transcription::TranscriptionConfiguration;
use serde::{Deserialize, Serialize};

/// Reply envelope sent back by the backend bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct BackendReply<T> {
    #[serde(rename = "Result")]
    pub result: Option<T>,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeetingRef {
    pub meeting_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendeeRef {
    pub meeting_id: String,
    pub attendee_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartTranscriptionRequest {
    pub meeting_id: String,
    pub transcription_configuration: TranscriptionConfiguration,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineRef {
    pub media_pipeline_id: String,
}

/// Reply to an identity lookup
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub account: String,
}
