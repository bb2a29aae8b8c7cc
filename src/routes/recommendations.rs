use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::CatalogItem,
    routes::AppState,
    services::recommendations,
};

/// Handler for personalized recommendations
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("User id cannot be empty".to_string()));
    }

    tracing::info!(request_id = %request_id, user_id = %user_id, "Processing recommendation request");

    let items = recommendations::get_recommendations(
        state.fetcher.as_ref(),
        state.interests.as_ref(),
        &user_id,
        &state.settings.recommendations,
    )
    .await?;

    Ok(Json(items))
}
