// Shared fixtures: a dispatcher wired to one in-memory backend per client variant.
#![allow(dead_code)]

use meeting_broker::{
    BackendClients, ConferenceClient, Dispatcher, MeetingRegistry, MemoryConferenceClient,
    StaticIdentity,
};
use std::sync::Arc;
use std::time::Duration;

pub const ACCOUNT_ID: &str = "111122223333";
pub const SINK_ARN: &str = "arn:aws:s3:::test-recordings";

pub struct Harness {
    pub legacy: Arc<MemoryConferenceClient>,
    pub enhanced: Arc<MemoryConferenceClient>,
    pub registry: Arc<MeetingRegistry>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub async fn total_calls(&self) -> usize {
        self.legacy.total_calls().await + self.enhanced.total_calls().await
    }
}

pub struct HarnessBuilder {
    force_enhanced: bool,
    capture_sink: Option<String>,
    latency: Duration,
    legacy_latency: Option<Duration>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            force_enhanced: false,
            capture_sink: Some(SINK_ARN.to_string()),
            latency: Duration::ZERO,
            legacy_latency: None,
        }
    }

    pub fn force_enhanced(mut self, force: bool) -> Self {
        self.force_enhanced = force;
        self
    }

    pub fn without_capture_sink(mut self) -> Self {
        self.capture_sink = None;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Latency for the legacy client only; the enhanced one keeps `latency`
    pub fn legacy_latency(mut self, latency: Duration) -> Self {
        self.legacy_latency = Some(latency);
        self
    }

    pub fn build(self) -> Harness {
        let legacy = Arc::new(
            MemoryConferenceClient::new("legacy")
                .with_latency(self.legacy_latency.unwrap_or(self.latency)),
        );
        let enhanced = Arc::new(MemoryConferenceClient::new("enhanced").with_latency(self.latency));

        let clients = BackendClients::new(
            Arc::clone(&legacy) as Arc<dyn ConferenceClient>,
            Arc::clone(&enhanced) as Arc<dyn ConferenceClient>,
            self.force_enhanced,
        );
        let registry = Arc::new(MeetingRegistry::new(clients));
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::new(StaticIdentity::new(ACCOUNT_ID)),
            self.capture_sink,
        );

        Harness {
            legacy,
            enhanced,
            registry,
            dispatcher,
        }
    }
}

/// Default harness: legacy client unless echo reduction is requested, capture sink set
pub fn harness() -> Harness {
    HarnessBuilder::new().build()
}
