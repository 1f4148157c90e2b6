use super::error::RegistryError;
use super::record::{truncate_external_id, MeetingRecord, MeetingRequest};
use crate::backend::{BackendClients, CreateMeetingRequest, MediaCapturePipeline, MeetingFeatures};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type CreateOutcome = Result<MeetingRecord, RegistryError>;

/// Registry entry for a title
enum Slot {
    Active(MeetingRecord),
    /// Backend creation in flight; settles to `Some(outcome)` exactly once.
    /// `token` is the idempotency token of that creation.
    Creating {
        token: String,
        settled: watch::Receiver<Option<CreateOutcome>>,
    },
}

/// Title → meeting map shared by all in-flight actions
pub struct MeetingRegistry {
    meetings: Arc<RwLock<HashMap<String, Slot>>>,
    clients: BackendClients,
}

impl MeetingRegistry {
    pub fn new(clients: BackendClients) -> Self {
        Self {
            meetings: Arc::new(RwLock::new(HashMap::new())),
            clients,
        }
    }

    pub fn clients(&self) -> &BackendClients {
        &self.clients
    }

    /// Return the meeting for `title`, creating it on the backend if absent.
    ///
    /// An existing meeting is returned as-is; `request` is then ignored.
    /// Concurrent calls for a title that is still being created wait for
    /// that creation and share its outcome. A failed creation leaves the
    /// title absent.
    pub async fn get_or_create(
        &self,
        title: &str,
        request: MeetingRequest,
    ) -> Result<MeetingRecord, RegistryError> {
        let (token, mut pending) = {
            let mut meetings = self.meetings.write().await;

            match meetings.get(title) {
                Some(Slot::Active(record)) => return Ok(record.clone()),
                Some(Slot::Creating { token, settled }) if settled.has_changed().is_ok() => {
                    debug!("Waiting for in-flight creation of meeting '{}'", title);
                    (token.clone(), settled.clone())
                }
                _ => {
                    let media_region = request
                        .media_region
                        .filter(|region| !region.is_empty())
                        .ok_or(RegistryError::MissingRegion)?;

                    let primary = match request.primary_title.as_deref() {
                        Some(primary_title) => match meetings.get(primary_title) {
                            Some(Slot::Active(primary)) => Some(primary.clone()),
                            _ => {
                                return Err(RegistryError::PrimaryNotFound(
                                    primary_title.to_string(),
                                ))
                            }
                        },
                        None => None,
                    };

                    let token = Uuid::new_v4().to_string();
                    let (tx, rx) = watch::channel(None);
                    meetings.insert(
                        title.to_string(),
                        Slot::Creating {
                            token: token.clone(),
                            settled: rx.clone(),
                        },
                    );
                    self.spawn_creation(
                        title.to_string(),
                        token.clone(),
                        media_region,
                        request.echo_reduction,
                        primary,
                        tx,
                    );
                    (token, rx)
                }
            }
        };

        let outcome = match pending.wait_for(Option::is_some).await {
            Ok(settled) => (*settled).clone(),
            Err(_) => None,
        };

        match outcome {
            Some(outcome) => outcome,
            None => {
                // The creating task died without settling; free the title
                let mut meetings = self.meetings.write().await;
                let stale = matches!(
                    meetings.get(title),
                    Some(Slot::Creating { token: current, .. }) if *current == token
                );
                if stale {
                    meetings.remove(title);
                }
                error!("Creation of meeting '{}' aborted", title);
                Err(RegistryError::CreationAborted)
            }
        }
    }

    /// Runs the backend creation detached from the caller, so a dropped
    /// request cannot strand the waiters.
    fn spawn_creation(
        &self,
        title: String,
        token: String,
        media_region: String,
        echo_reduction: bool,
        primary: Option<MeetingRecord>,
        settle: watch::Sender<Option<CreateOutcome>>,
    ) {
        let meetings = Arc::clone(&self.meetings);
        let client = self.clients.for_creation(echo_reduction);

        tokio::spawn(async move {
            let request = CreateMeetingRequest {
                client_request_token: token,
                media_region,
                external_meeting_id: truncate_external_id(&title),
                primary_meeting_id: primary.as_ref().map(|p| p.meeting_id().to_string()),
                meeting_features: echo_reduction.then(MeetingFeatures::echo_reduction),
            };

            if let Some(primary) = &primary {
                info!(
                    "Retrieved primary meeting ID {} for external meeting ID {}",
                    primary.meeting_id(),
                    primary.title
                );
            }

            let outcome = client
                .create_meeting(request)
                .await
                .map(|meeting| {
                    MeetingRecord::new(
                        title.clone(),
                        meeting,
                        primary.as_ref().map(MeetingRecord::external_meeting_id),
                    )
                })
                .map_err(RegistryError::from);

            {
                let mut meetings = meetings.write().await;
                match &outcome {
                    Ok(record) => {
                        info!(
                            "Created meeting '{}' ({}) in {} via {}",
                            title,
                            record.meeting_id(),
                            record.meeting.media_region,
                            client.name()
                        );
                        meetings.insert(title.clone(), Slot::Active(record.clone()));
                    }
                    Err(e) => {
                        error!("Failed to create meeting '{}': {}", title, e);
                        meetings.remove(&title);
                    }
                }
            }

            settle.send_replace(Some(outcome));
        });
    }

    /// Active meeting for `title`; in-flight creations count as absent
    pub async fn get(&self, title: &str) -> Result<MeetingRecord, RegistryError> {
        let meetings = self.meetings.read().await;
        match meetings.get(title) {
            Some(Slot::Active(record)) => Ok(record.clone()),
            _ => Err(RegistryError::MeetingNotFound(title.to_string())),
        }
    }

    /// Forget the meeting for `title`. Removing an absent title is a no-op.
    ///
    /// Meetings that name this one as primary keep their (now stale) link.
    pub async fn remove(&self, title: &str) -> Option<MeetingRecord> {
        self.remove_where(title, None).await
    }

    /// Forget the meeting for `title` only if it is still backend meeting
    /// `meeting_id`; a meeting re-created under the title stays.
    pub async fn remove_meeting(&self, title: &str, meeting_id: &str) -> Option<MeetingRecord> {
        self.remove_where(title, Some(meeting_id)).await
    }

    async fn remove_where(&self, title: &str, meeting_id: Option<&str>) -> Option<MeetingRecord> {
        let mut meetings = self.meetings.write().await;

        let matches = match meetings.get(title) {
            Some(Slot::Active(record)) => meeting_id.map_or(true, |id| record.meeting_id() == id),
            _ => false,
        };
        let removed = match matches.then(|| meetings.remove(title)).flatten() {
            Some(Slot::Active(record)) => Some(record),
            _ => None,
        };

        if let Some(record) = &removed {
            let external_id = record.external_meeting_id();
            let dependents: Vec<&str> = meetings
                .values()
                .filter_map(|slot| match slot {
                    Slot::Active(other)
                        if other.primary_external_meeting_id.as_deref()
                            == Some(external_id.as_str()) =>
                    {
                        Some(other.title.as_str())
                    }
                    _ => None,
                })
                .collect();

            if !dependents.is_empty() {
                warn!(
                    "Removed primary meeting '{}' still referenced by: {}",
                    title,
                    dependents.join(", ")
                );
            }
            let lifetime = Utc::now().signed_duration_since(record.created_at);
            info!(
                "Removed meeting '{}' ({}) after {}s",
                title,
                record.meeting_id(),
                lifetime.num_seconds()
            );
        }

        removed
    }

    /// Record a running capture pipeline on backend meeting `meeting_id`.
    ///
    /// Fails with `MeetingNotFound` if `title` now names another meeting.
    pub async fn attach_capture(
        &self,
        title: &str,
        meeting_id: &str,
        pipeline: MediaCapturePipeline,
    ) -> Result<(), RegistryError> {
        let mut meetings = self.meetings.write().await;
        match meetings.get_mut(title) {
            Some(Slot::Active(record)) if record.meeting_id() == meeting_id => {
                if record.capture.is_some() {
                    return Err(RegistryError::CaptureAlreadyActive(title.to_string()));
                }
                record.capture = Some(pipeline);
                Ok(())
            }
            _ => Err(RegistryError::MeetingNotFound(title.to_string())),
        }
    }

    /// Take the running capture pipeline off backend meeting `meeting_id`
    pub async fn detach_capture(
        &self,
        title: &str,
        meeting_id: &str,
    ) -> Result<MediaCapturePipeline, RegistryError> {
        let mut meetings = self.meetings.write().await;
        match meetings.get_mut(title) {
            Some(Slot::Active(record)) if record.meeting_id() == meeting_id => record
                .capture
                .take()
                .ok_or_else(|| RegistryError::NoActiveCapture(title.to_string())),
            _ => Err(RegistryError::MeetingNotFound(title.to_string())),
        }
    }

    /// Titles of active meetings linked to `title` as their primary
    pub async fn dependents(&self, title: &str) -> Vec<String> {
        let meetings = self.meetings.read().await;
        let external_id = match meetings.get(title) {
            Some(Slot::Active(record)) => record.external_meeting_id(),
            _ => truncate_external_id(title),
        };

        meetings
            .values()
            .filter_map(|slot| match slot {
                Slot::Active(record)
                    if record.primary_external_meeting_id.as_deref() == Some(external_id.as_str()) =>
                {
                    Some(record.title.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of active meetings
    pub async fn len(&self) -> usize {
        let meetings = self.meetings.read().await;
        meetings
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
