use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    routes::AppState,
    services::accumulator::{PassKind, SessionSnapshot, TriggerResult},
};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_mode")]
    pub mode: PassKind,
}

fn default_mode() -> PassKind {
    PassKind::Fresh
}

/// Handler for a query change or "load more" on a search session
///
/// Fetch failures are reported in the body with the partial results, not as
/// an HTTP error, so the client can keep showing them and offer a retry.
pub async fn trigger(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Json<TriggerResult> {
    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        query = %request.query,
        mode = ?request.mode,
        "Processing search trigger"
    );

    let result = state
        .sessions
        .trigger(&session_id, &request.query, request.mode)
        .await;

    Json(result)
}

/// Handler returning the current state of a search session
pub async fn snapshot(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionSnapshot>> {
    state
        .sessions
        .snapshot(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Search session {}", session_id)))
}

/// Handler discarding a search session
pub async fn discard(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    if state.sessions.discard(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Search session {}", session_id)))
    }
}
