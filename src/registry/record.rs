use crate::backend::{MediaCapturePipeline, Meeting};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Longest external identifier the backend accepts
pub const MAX_EXTERNAL_ID_LEN: usize = 64;

/// Cut `value` to [`MAX_EXTERNAL_ID_LEN`] characters
pub fn truncate_external_id(value: &str) -> String {
    value.chars().take(MAX_EXTERNAL_ID_LEN).collect()
}

/// What a join asks for when the meeting may not exist yet
#[derive(Debug, Clone, Default)]
pub struct MeetingRequest {
    /// Required only when the meeting is created
    pub media_region: Option<String>,

    /// Request the echo-reduction audio feature (pins the enhanced client)
    pub echo_reduction: bool,

    /// Title of an active meeting to link as primary
    pub primary_title: Option<String>,
}

/// A meeting known to the broker
#[derive(Debug, Clone, Serialize)]
pub struct MeetingRecord {
    /// Registry key, as chosen by the caller (not truncated)
    pub title: String,

    /// Backend meeting; its id never changes for the record's lifetime
    pub meeting: Meeting,

    /// External id of the linked primary meeting, fixed at creation
    pub primary_external_meeting_id: Option<String>,

    /// Present exactly while a capture pipeline is running
    pub capture: Option<MediaCapturePipeline>,

    pub created_at: DateTime<Utc>,
}

impl MeetingRecord {
    pub fn new(title: String, meeting: Meeting, primary_external_meeting_id: Option<String>) -> Self {
        Self {
            title,
            meeting,
            primary_external_meeting_id,
            capture: None,
            created_at: Utc::now(),
        }
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting.meeting_id
    }

    /// External id as the backend knows it
    pub fn external_meeting_id(&self) -> String {
        self.meeting
            .external_meeting_id
            .clone()
            .unwrap_or_else(|| truncate_external_id(&self.title))
    }

    pub fn echo_reduction(&self) -> bool {
        self.meeting.echo_reduction_available()
    }
}
