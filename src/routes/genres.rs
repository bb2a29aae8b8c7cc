use axum::{extract::State, Json};

use crate::{error::AppResult, routes::AppState, services::genres::GenreTable};

/// Handler for the genre id to name tables
pub async fn list(State(state): State<AppState>) -> AppResult<Json<GenreTable>> {
    let table = state.genres.get(state.fetcher.as_ref()).await?;
    Ok(Json(table.clone()))
}
