//! HTTP API for the browser client
//!
//! - POST /join, /end, /deleteAttendee - Meeting and attendee lifecycle
//! - POST /startCapture, /endCapture - Cloud media capture
//! - POST /start_transcription, /stop_transcription - Live transcription
//! - GET /health - Health check
//!
//! Parameters travel in the query string; anything unmatched is a 404.

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;

use anyhow::{Context, Result};
use tracing::info;

/// Serve `state` on `bind:port` until Ctrl-C
pub async fn serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running at http://{}/", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
