//! Wire shapes exchanged with the conferencing backend.
//!
//! Field names follow the backend's PascalCase convention so the join
//! payload can be handed to the browser client unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AudioFeatures {
    pub echo_reduction: FeatureStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeetingFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioFeatures>,
}

impl MeetingFeatures {
    /// Features requested when the caller asks for echo reduction
    pub fn echo_reduction() -> Self {
        Self {
            audio: Some(AudioFeatures {
                echo_reduction: FeatureStatus::Available,
            }),
        }
    }
}

/// Meeting as created by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meeting {
    pub meeting_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_meeting_id: Option<String>,

    pub media_region: String,

    /// Signaling/media URLs; opaque to the broker, relayed to the browser
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_placement: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_features: Option<MeetingFeatures>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_meeting_id: Option<String>,
}

impl Meeting {
    pub fn echo_reduction_available(&self) -> bool {
        matches!(
            self.meeting_features,
            Some(MeetingFeatures {
                audio: Some(AudioFeatures {
                    echo_reduction: FeatureStatus::Available
                })
            })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attendee {
    pub attendee_id: String,
    pub external_user_id: String,
    pub join_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMeetingRequest {
    /// Fresh per attempt; lets the backend collapse transport-level retries
    pub client_request_token: String,
    pub media_region: String,
    pub external_meeting_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_meeting_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_features: Option<MeetingFeatures>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAttendeeRequest {
    pub meeting_id: String,
    pub external_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateCapturePipelineRequest {
    pub source_type: String,
    pub source_arn: String,
    pub sink_type: String,
    pub sink_arn: String,
}

impl CreateCapturePipelineRequest {
    /// Capture of a live meeting into a storage bucket
    pub fn meeting_to_bucket(source_arn: String, sink_arn: &str) -> Self {
        Self {
            source_type: "ChimeSdkMeeting".to_string(),
            source_arn,
            sink_type: "S3Bucket".to_string(),
            sink_arn: sink_arn.to_string(),
        }
    }
}

/// Descriptor of a running capture pipeline; its id is the capture handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaCapturePipeline {
    pub media_pipeline_id: String,
    pub source_type: String,
    pub source_arn: String,
    pub sink_type: String,
    pub sink_arn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
