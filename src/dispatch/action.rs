/// Outcome status of a successful action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Ok,
    Created,
}

/// The fixed set of actions the broker accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Join,
    End,
    DeleteAttendee,
    StartCapture,
    EndCapture,
    StartTranscription,
    StopTranscription,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Join,
        Action::End,
        Action::DeleteAttendee,
        Action::StartCapture,
        Action::EndCapture,
        Action::StartTranscription,
        Action::StopTranscription,
    ];

    /// Name as it appears in the request path
    pub fn name(self) -> &'static str {
        match self {
            Action::Join => "join",
            Action::End => "end",
            Action::DeleteAttendee => "deleteAttendee",
            Action::StartCapture => "startCapture",
            Action::EndCapture => "endCapture",
            Action::StartTranscription => "start_transcription",
            Action::StopTranscription => "stop_transcription",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    /// Parameters checked before anything else runs.
    ///
    /// `region` for join is conditional on the meeting being new and is
    /// enforced by the registry instead.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Action::Join => &["title", "name"],
            Action::DeleteAttendee => &["title", "attendeeId"],
            Action::StartTranscription => &["title", "engine"],
            Action::End | Action::StartCapture | Action::EndCapture | Action::StopTranscription => {
                &["title"]
            }
        }
    }

    pub fn success_status(self) -> ActionStatus {
        match self {
            Action::Join | Action::DeleteAttendee | Action::StartCapture => ActionStatus::Created,
            Action::End | Action::EndCapture | Action::StartTranscription | Action::StopTranscription => {
                ActionStatus::Ok
            }
        }
    }
}
