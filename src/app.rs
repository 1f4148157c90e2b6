//! Wiring from configuration to a running server

use crate::backend::{
    self, BackendClients, ClientVariant, ConferenceClient, IdentityProvider,
    MemoryConferenceClient, NatsConferenceClient, NatsIdentity, StaticIdentity, TimeoutClient,
};
use crate::config::{BackendKind, Config};
use crate::dispatch::Dispatcher;
use crate::http::{self, AppState};
use crate::registry::MeetingRegistry;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Account id used with the memory backend when none is configured
const LOCAL_ACCOUNT_ID: &str = "000000000000";

/// Build the dispatcher described by `cfg`, connecting to the backend
pub async fn build_dispatcher(cfg: &Config) -> Result<Dispatcher> {
    let timeout = Duration::from_secs(cfg.backend.request_timeout_secs);

    let (legacy, enhanced, identity): (
        Arc<dyn ConferenceClient>,
        Arc<dyn ConferenceClient>,
        Arc<dyn IdentityProvider>,
    ) = match cfg.backend.kind {
        BackendKind::Nats => {
            let client = backend::connect_nats(&cfg.backend.nats_url).await?;
            let prefix = &cfg.backend.subject_prefix;
            let identity: Arc<dyn IdentityProvider> = match &cfg.capture.account_id {
                Some(account) => Arc::new(StaticIdentity::new(account.clone())),
                None => Arc::new(NatsIdentity::new(client.clone(), prefix)),
            };
            let legacy: Arc<dyn ConferenceClient> = Arc::new(NatsConferenceClient::new(
                client.clone(),
                prefix,
                ClientVariant::Legacy,
            ));
            let enhanced: Arc<dyn ConferenceClient> =
                Arc::new(NatsConferenceClient::new(client, prefix, ClientVariant::Enhanced));
            (legacy, enhanced, identity)
        }
        BackendKind::Memory => {
            info!("Using in-memory conferencing backend");
            let account = cfg
                .capture
                .account_id
                .clone()
                .unwrap_or_else(|| LOCAL_ACCOUNT_ID.to_string());
            // Both variants share one fake backend, as they share one real one
            let shared: Arc<dyn ConferenceClient> = Arc::new(MemoryConferenceClient::new("memory"));
            let legacy = Arc::clone(&shared);
            let enhanced = shared;
            let identity: Arc<dyn IdentityProvider> = Arc::new(StaticIdentity::new(account));
            (legacy, enhanced, identity)
        }
    };

    let clients = BackendClients::new(
        Arc::new(TimeoutClient::new(legacy, timeout)),
        Arc::new(TimeoutClient::new(enhanced, timeout)),
        cfg.backend.force_enhanced,
    );

    match &cfg.capture.sink_arn {
        Some(sink) => info!("S3 destination for capture is {}", sink),
        None => info!("S3 destination for capture not set. Cloud media capture will not be available."),
    }

    let registry = Arc::new(MeetingRegistry::new(clients));
    Ok(Dispatcher::new(registry, identity, cfg.capture.sink_arn.clone()))
}

/// Run the broker until Ctrl-C
pub async fn run(cfg: Config) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Backend: {:?} (force enhanced client: {}, timeout {}s)",
        cfg.backend.kind, cfg.backend.force_enhanced, cfg.backend.request_timeout_secs
    );

    let dispatcher = build_dispatcher(&cfg).await?;
    http::serve(
        AppState::new(dispatcher),
        &cfg.service.http.bind,
        cfg.service.http.port,
    )
    .await
}
