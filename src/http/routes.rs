use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route(
            "/health",
            get(handlers::health_check).fallback(handlers::not_found),
        )
        // Meeting actions (join, end, deleteAttendee, startCapture, ...)
        .route(
            "/:action",
            post(handlers::dispatch_action).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        // Add tracing middleware for request logging
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
