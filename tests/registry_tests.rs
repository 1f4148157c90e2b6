// Meeting registry: get-or-create, singleflight creation, capture bookkeeping, removal.

mod common;

use common::{harness, HarnessBuilder};
use meeting_broker::backend::{BackendClients, BackendError, MediaCapturePipeline, TimeoutClient};
use meeting_broker::registry::MAX_EXTERNAL_ID_LEN;
use meeting_broker::{
    ClientVariant, ConferenceClient, MeetingRecord, MeetingRegistry, MeetingRequest,
    MemoryConferenceClient, Operation, RegistryError,
};
use async_trait::async_trait;
use meeting_broker::backend::{
    Attendee, CreateAttendeeRequest, CreateCapturePipelineRequest, CreateMeetingRequest, Meeting,
};
use meeting_broker::transcription::TranscriptionConfiguration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn in_region(region: &str) -> MeetingRequest {
    MeetingRequest {
        media_region: Some(region.to_string()),
        ..Default::default()
    }
}

fn pipeline(id: &str) -> MediaCapturePipeline {
    MediaCapturePipeline {
        media_pipeline_id: id.to_string(),
        source_type: "ChimeSdkMeeting".to_string(),
        source_arn: "arn:aws:chime::1:meeting:m".to_string(),
        sink_type: "S3Bucket".to_string(),
        sink_arn: "arn:aws:s3:::bucket".to_string(),
        status: None,
    }
}

/// Memory backend whose first create_meeting panics mid-call
struct PanicsOnFirstCreate {
    inner: MemoryConferenceClient,
    panicked: AtomicBool,
}

#[async_trait]
impl ConferenceClient for PanicsOnFirstCreate {
    async fn create_meeting(&self, request: CreateMeetingRequest) -> Result<Meeting, BackendError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("backend client crashed");
        }
        self.inner.create_meeting(request).await
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), BackendError> {
        self.inner.delete_meeting(meeting_id).await
    }

    async fn create_attendee(&self, request: CreateAttendeeRequest) -> Result<Attendee, BackendError> {
        self.inner.create_attendee(request).await
    }

    async fn delete_attendee(&self, meeting_id: &str, attendee_id: &str) -> Result<(), BackendError> {
        self.inner.delete_attendee(meeting_id, attendee_id).await
    }

    async fn start_transcription(
        &self,
        meeting_id: &str,
        configuration: &TranscriptionConfiguration,
    ) -> Result<(), BackendError> {
        self.inner.start_transcription(meeting_id, configuration).await
    }

    async fn stop_transcription(&self, meeting_id: &str) -> Result<(), BackendError> {
        self.inner.stop_transcription(meeting_id).await
    }

    async fn create_capture_pipeline(
        &self,
        request: CreateCapturePipelineRequest,
    ) -> Result<MediaCapturePipeline, BackendError> {
        self.inner.create_capture_pipeline(request).await
    }

    async fn delete_capture_pipeline(&self, pipeline_id: &str) -> Result<(), BackendError> {
        self.inner.delete_capture_pipeline(pipeline_id).await
    }

    fn name(&self) -> &str {
        "panics-on-first-create"
    }
}

#[tokio::test]
async fn test_concurrent_get_or_create_creates_once() {
    let h = HarnessBuilder::new()
        .latency(Duration::from_millis(50))
        .build();

    let calls = (0..16).map(|_| h.registry.get_or_create("standup", in_region("us-east-1")));
    let results = futures::future::join_all(calls).await;

    let records: Vec<MeetingRecord> = results.into_iter().map(|r| r.unwrap()).collect();
    let first_id = records[0].meeting_id().to_string();
    assert!(records.iter().all(|r| r.meeting_id() == first_id));
    assert_eq!(h.legacy.call_count(Operation::CreateMeeting).await, 1);
    assert_eq!(h.legacy.meeting_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_across_tasks() {
    let h = HarnessBuilder::new()
        .latency(Duration::from_millis(100))
        .build();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&h.registry);
            tokio::spawn(async move {
                registry
                    .get_or_create("all-hands", in_region("eu-west-1"))
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().meeting_id().to_string());
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(h.legacy.call_count(Operation::CreateMeeting).await, 1);
}

#[tokio::test]
async fn test_missing_region_makes_no_backend_call() {
    let h = harness();

    let err = h
        .registry
        .get_or_create("new", MeetingRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::MissingRegion);

    let err = h
        .registry
        .get_or_create("new", in_region(""))
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::MissingRegion);

    assert_eq!(h.total_calls().await, 0);
    assert!(h.registry.get("new").await.is_err());
}

#[tokio::test]
async fn test_existing_meeting_ignores_creation_arguments() {
    let h = harness();
    let created = h
        .registry
        .get_or_create("retro", in_region("us-east-1"))
        .await
        .unwrap();

    let again = h
        .registry
        .get_or_create(
            "retro",
            MeetingRequest {
                media_region: None,
                echo_reduction: true,
                primary_title: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(again.meeting_id(), created.meeting_id());
    assert_eq!(again.meeting.media_region, "us-east-1");
    assert!(!again.echo_reduction());
    assert_eq!(h.total_calls().await, 1);
}

#[tokio::test]
async fn test_unknown_primary_makes_no_backend_call() {
    let h = harness();

    let err = h
        .registry
        .get_or_create(
            "breakout",
            MeetingRequest {
                media_region: Some("us-east-1".to_string()),
                echo_reduction: false,
                primary_title: Some("main-stage".to_string()),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::PrimaryNotFound("main-stage".to_string()));
    assert_eq!(h.total_calls().await, 0);
}

#[tokio::test]
async fn test_primary_link_is_recorded() {
    let h = harness();
    let primary = h
        .registry
        .get_or_create("main-stage", in_region("us-east-1"))
        .await
        .unwrap();

    let breakout = h
        .registry
        .get_or_create(
            "breakout",
            MeetingRequest {
                media_region: Some("us-east-1".to_string()),
                echo_reduction: false,
                primary_title: Some("main-stage".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        breakout.primary_external_meeting_id.as_deref(),
        Some("main-stage")
    );
    assert_eq!(
        breakout.meeting.primary_meeting_id.as_deref(),
        Some(primary.meeting_id())
    );
    assert_eq!(h.registry.dependents("main-stage").await, vec!["breakout"]);
}

#[tokio::test]
async fn test_removing_primary_leaves_stale_reference() {
    let h = harness();
    h.registry
        .get_or_create("main-stage", in_region("us-east-1"))
        .await
        .unwrap();
    h.registry
        .get_or_create(
            "breakout",
            MeetingRequest {
                media_region: Some("us-east-1".to_string()),
                echo_reduction: false,
                primary_title: Some("main-stage".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(h.registry.remove("main-stage").await.is_some());

    let breakout = h.registry.get("breakout").await.unwrap();
    assert_eq!(
        breakout.primary_external_meeting_id.as_deref(),
        Some("main-stage")
    );
}

#[tokio::test]
async fn test_failed_creation_is_shared_and_leaves_title_absent() {
    let h = HarnessBuilder::new()
        .latency(Duration::from_millis(20))
        .build();
    h.legacy
        .fail_next(Operation::CreateMeeting, "service unavailable")
        .await;

    let calls = (0..4).map(|_| h.registry.get_or_create("flaky", in_region("us-east-1")));
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(
            result.unwrap_err(),
            RegistryError::Backend(BackendError::Service("service unavailable".to_string()))
        );
    }
    assert_eq!(h.legacy.call_count(Operation::CreateMeeting).await, 1);
    assert!(h.registry.get("flaky").await.is_err());

    // A later attempt is a fresh creation
    let record = h
        .registry
        .get_or_create("flaky", in_region("us-east-1"))
        .await
        .unwrap();
    assert_eq!(h.legacy.call_count(Operation::CreateMeeting).await, 2);
    assert_eq!(h.registry.get("flaky").await.unwrap().meeting_id(), record.meeting_id());
}

#[tokio::test]
async fn test_creation_timeout_is_retryable() {
    let slow = Arc::new(MemoryConferenceClient::new("slow").with_latency(Duration::from_millis(200)));
    let bounded: Arc<dyn ConferenceClient> = Arc::new(TimeoutClient::new(
        Arc::clone(&slow) as Arc<dyn ConferenceClient>,
        Duration::from_millis(20),
    ));
    let registry = MeetingRegistry::new(BackendClients::new(
        Arc::clone(&bounded),
        bounded,
        false,
    ));

    let err = registry
        .get_or_create("slow", in_region("us-east-1"))
        .await
        .unwrap_err();

    match err {
        RegistryError::Backend(backend) => {
            assert_eq!(backend, BackendError::Timeout(Duration::from_millis(20)));
            assert!(backend.is_retryable());
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(registry.get("slow").await.is_err());
}

#[tokio::test]
async fn test_echo_reduction_pins_enhanced_client() {
    let h = harness();

    let plain = h
        .registry
        .get_or_create("plain", in_region("us-east-1"))
        .await
        .unwrap();
    let echo = h
        .registry
        .get_or_create(
            "echo",
            MeetingRequest {
                media_region: Some("us-east-1".to_string()),
                echo_reduction: true,
                primary_title: None,
            },
        )
        .await
        .unwrap();

    assert!(!plain.echo_reduction());
    assert!(echo.echo_reduction());
    assert_eq!(h.legacy.call_count(Operation::CreateMeeting).await, 1);
    assert_eq!(h.enhanced.call_count(Operation::CreateMeeting).await, 1);
    assert_eq!(ClientVariant::for_meeting(false, Some(&echo)), ClientVariant::Enhanced);
    assert_eq!(ClientVariant::for_meeting(false, Some(&plain)), ClientVariant::Legacy);
}

#[tokio::test]
async fn test_forced_enhanced_client_creates_everything() {
    let h = HarnessBuilder::new().force_enhanced(true).build();

    h.registry
        .get_or_create("plain", in_region("us-east-1"))
        .await
        .unwrap();

    assert_eq!(h.legacy.total_calls().await, 0);
    assert_eq!(h.enhanced.call_count(Operation::CreateMeeting).await, 1);
}

#[test]
fn test_variant_selection_table() {
    assert_eq!(ClientVariant::for_meeting(true, None), ClientVariant::Enhanced);
    assert_eq!(ClientVariant::for_meeting(false, None), ClientVariant::Legacy);
    assert_eq!(ClientVariant::for_creation(true, false), ClientVariant::Enhanced);
    assert_eq!(ClientVariant::for_creation(false, true), ClientVariant::Enhanced);
    assert_eq!(ClientVariant::for_creation(false, false), ClientVariant::Legacy);
}

#[tokio::test]
async fn test_long_title_is_truncated_for_backend() {
    let h = harness();
    let title = "x".repeat(100);

    let record = h
        .registry
        .get_or_create(&title, in_region("us-east-1"))
        .await
        .unwrap();

    assert_eq!(record.title, title);
    assert_eq!(
        record.meeting.external_meeting_id.as_deref().map(str::len),
        Some(MAX_EXTERNAL_ID_LEN)
    );
    assert!(h.registry.get(&title).await.is_ok());
}

#[tokio::test]
async fn test_capture_attach_and_detach() {
    let h = harness();
    let record = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();
    let id = record.meeting_id();

    h.registry.attach_capture("demo", id, pipeline("p-1")).await.unwrap();
    assert_eq!(
        h.registry.attach_capture("demo", id, pipeline("p-2")).await,
        Err(RegistryError::CaptureAlreadyActive("demo".to_string()))
    );

    let detached = h.registry.detach_capture("demo", id).await.unwrap();
    assert_eq!(detached.media_pipeline_id, "p-1");
    assert!(h.registry.get("demo").await.unwrap().capture.is_none());

    assert_eq!(
        h.registry.detach_capture("demo", id).await,
        Err(RegistryError::NoActiveCapture("demo".to_string()))
    );
    assert_eq!(
        h.registry.detach_capture("missing", id).await,
        Err(RegistryError::MeetingNotFound("missing".to_string()))
    );
}

#[tokio::test]
async fn test_capture_bookkeeping_is_keyed_on_meeting_id() {
    let h = harness();
    let old = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();
    h.registry.remove("demo").await;
    let current = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();

    assert_eq!(
        h.registry
            .attach_capture("demo", old.meeting_id(), pipeline("p-old"))
            .await,
        Err(RegistryError::MeetingNotFound("demo".to_string()))
    );
    assert!(h.registry.get("demo").await.unwrap().capture.is_none());

    h.registry
        .attach_capture("demo", current.meeting_id(), pipeline("p-1"))
        .await
        .unwrap();
    assert_eq!(
        h.registry.detach_capture("demo", old.meeting_id()).await,
        Err(RegistryError::MeetingNotFound("demo".to_string()))
    );
    assert!(h.registry.get("demo").await.unwrap().capture.is_some());
}

#[tokio::test]
async fn test_remove_meeting_keeps_recreated_meeting() {
    let h = harness();
    let old = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();
    h.registry.remove("demo").await;
    let current = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();

    assert!(h
        .registry
        .remove_meeting("demo", old.meeting_id())
        .await
        .is_none());
    assert_eq!(
        h.registry.get("demo").await.unwrap().meeting_id(),
        current.meeting_id()
    );

    assert!(h
        .registry
        .remove_meeting("demo", current.meeting_id())
        .await
        .is_some());
    assert!(h.registry.is_empty().await);
}

#[tokio::test]
async fn test_remove_is_idempotent_and_clears_state() {
    let h = harness();
    let first = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();
    h.registry
        .attach_capture("demo", first.meeting_id(), pipeline("p-1"))
        .await
        .unwrap();

    assert!(h.registry.remove("demo").await.is_some());
    assert!(h.registry.remove("demo").await.is_none());
    assert!(h.registry.is_empty().await);

    let second = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();
    assert_ne!(second.meeting_id(), first.meeting_id());
    assert!(second.capture.is_none());
    assert_eq!(h.legacy.call_count(Operation::CreateMeeting).await, 2);
}

#[tokio::test]
async fn test_crashed_creation_frees_title_for_retry() {
    let client: Arc<dyn ConferenceClient> = Arc::new(PanicsOnFirstCreate {
        inner: MemoryConferenceClient::new("memory"),
        panicked: AtomicBool::new(false),
    });
    let registry = MeetingRegistry::new(BackendClients::new(Arc::clone(&client), client, false));

    let calls = (0..3).map(|_| registry.get_or_create("wedged", in_region("us-east-1")));
    for result in futures::future::join_all(calls).await {
        assert_eq!(result.unwrap_err(), RegistryError::CreationAborted);
    }
    assert!(registry.get("wedged").await.is_err());

    let record = tokio::time::timeout(
        Duration::from_secs(1),
        registry.get_or_create("wedged", in_region("us-east-1")),
    )
    .await
    .expect("retry must not wait on the crashed creation")
    .unwrap();
    assert_eq!(registry.get("wedged").await.unwrap().meeting_id(), record.meeting_id());
}

#[tokio::test]
async fn test_record_carries_creation_time() {
    let h = harness();
    let before = chrono::Utc::now();

    let record = h
        .registry
        .get_or_create("demo", in_region("us-east-1"))
        .await
        .unwrap();

    assert!(record.created_at >= before);
    assert!(record.created_at <= chrono::Utc::now());

    let removed = h.registry.remove("demo").await.unwrap();
    assert_eq!(removed.created_at, record.created_at);
}
