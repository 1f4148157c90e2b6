use anyhow::Result;
use clap::Parser;
use meeting_broker::config::BackendKind;
use meeting_broker::{app, Config};
use tracing_subscriber::EnvFilter;

/// Signaling server brokering meetings on a conferencing backend
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/meeting-broker")]
    config: String,

    /// Address to bind, overrides service.http.bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overrides service.http.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend transport, overrides backend.kind
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut cfg = Config::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }
    if let Some(kind) = cli.backend {
        cfg.backend.kind = kind;
    }

    app::run(cfg).await
}
