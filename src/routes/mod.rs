use axum::{
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppSettings,
    db::InterestStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{accumulator::SearchSessions, genres::GenreDirectory, providers::CatalogFetcher},
};

pub mod catalog;
pub mod genres;
pub mod pagination;
pub mod recommendations;
pub mod search;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn CatalogFetcher>,
    pub interests: Arc<dyn InterestStore>,
    pub sessions: Arc<SearchSessions>,
    pub genres: Arc<GenreDirectory>,
    pub settings: AppSettings,
}

impl AppState {
    pub fn new(
        fetcher: Arc<dyn CatalogFetcher>,
        interests: Arc<dyn InterestStore>,
        settings: AppSettings,
    ) -> Self {
        Self {
            sessions: Arc::new(SearchSessions::new(fetcher.clone(), settings.accumulator)),
            genres: Arc::new(GenreDirectory::new()),
            fetcher,
            interests,
            settings,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/:category", get(catalog::discover))
        .route("/catalog/:category/trending", get(catalog::trending))
        .route(
            "/search/sessions/:session_id",
            get(search::snapshot)
                .post(search::trigger)
                .delete(search::discard),
        )
        .route("/recommendations/:user_id", get(recommendations::recommend))
        .route("/genres", get(genres::list))
        .route("/pagination", get(pagination::window))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
