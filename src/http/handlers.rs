use super::state::AppState;
use crate::dispatch::{ActionStatus, DispatchError, Params};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            DispatchError::BadRequest(_) | DispatchError::Backend(_) => StatusCode::BAD_REQUEST,
            DispatchError::UnknownAction(_) | DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::Conflict(_) => StatusCode::CONFLICT,
            DispatchError::BackendTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::ConfigurationUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// POST /:action
/// Run a meeting action with its query parameters
pub async fn dispatch_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, DispatchError> {
    let params = Params::from(query);
    let outcome = state.dispatcher.dispatch(&action, &params).await?;

    let status = match outcome.status {
        ActionStatus::Ok => StatusCode::OK,
        ActionStatus::Created => StatusCode::CREATED,
    };

    Ok((status, Json(outcome.body)).into_response())
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let meetings = state.dispatcher.registry().len().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "meetings": meetings })),
    )
}

/// Any unmatched route or method
pub async fn not_found() -> impl IntoResponse {
    DispatchError::UnknownAction(String::new())
}
