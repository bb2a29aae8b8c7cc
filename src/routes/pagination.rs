use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    routes::AppState,
    services::pagination::{pagination_window, PageToken},
};

/// Largest window a client may ask for
pub const MAX_WINDOW: u32 = 21;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub current_page: u32,
    pub total_pages: u32,
    pub window: Option<u32>,
}

/// Window sizes must be odd so the current page can sit in the middle
fn validate_window(window: u32) -> AppResult<u32> {
    if window == 0 || window % 2 == 0 || window > MAX_WINDOW {
        return Err(AppError::InvalidInput(format!(
            "Window must be an odd number between 1 and {}",
            MAX_WINDOW
        )));
    }
    Ok(window)
}

/// Handler computing navigation tokens for a page position
pub async fn window(
    State(state): State<AppState>,
    Query(params): Query<WindowQuery>,
) -> AppResult<Json<Vec<PageToken>>> {
    let size = match params.window {
        Some(window) => validate_window(window)?,
        None => state.settings.pagination_window,
    };
    Ok(Json(pagination_window(
        params.current_page,
        params.total_pages,
        size,
    )))
}
