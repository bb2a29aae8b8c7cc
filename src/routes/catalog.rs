use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::Category,
    routes::AppState,
    services::{
        catalog::{browse, BrowsePage},
        providers::{DiscoverFilters, FallbackPolicy, FetchRequest, SortOrder},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    pub page: Option<u32>,
    /// Comma separated genre ids
    pub genres: Option<String>,
    /// Comma separated watch provider ids
    pub providers: Option<String>,
    pub region: Option<String>,
    pub sort: Option<SortOrder>,
    pub fallback: Option<FallbackPolicy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

pub(crate) fn parse_category(raw: &str) -> AppResult<Category> {
    Category::from_media_type(raw)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown category '{}'", raw)))
}

fn parse_id_list(raw: Option<&str>) -> AppResult<Vec<u32>> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid id '{}'", part)))
        })
        .collect()
}

/// Handler for filtered catalog listings
pub async fn discover(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(category): Path<String>,
    Query(params): Query<DiscoverQuery>,
) -> AppResult<Json<BrowsePage>> {
    let category = parse_category(&category)?;
    let request = FetchRequest::Discover {
        category,
        filters: DiscoverFilters {
            genres: parse_id_list(params.genres.as_deref())?,
            watch_providers: parse_id_list(params.providers.as_deref())?,
            watch_region: params.region.filter(|r| !r.trim().is_empty()),
            sort: params.sort.unwrap_or_default(),
            fallback: params.fallback.unwrap_or_default(),
        },
    };

    tracing::debug!(request_id = %request_id, request = %request, "Browsing catalog");

    let page = browse(
        state.fetcher.as_ref(),
        &request,
        params.page.unwrap_or(1),
        &state.settings.quality,
        state.settings.pagination_window,
    )
    .await?;

    Ok(Json(page))
}

/// Handler for the weekly trending list of a category
pub async fn trending(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<BrowsePage>> {
    let request = FetchRequest::Trending {
        category: parse_category(&category)?,
    };

    let page = browse(
        state.fetcher.as_ref(),
        &request,
        params.page.unwrap_or(1),
        &state.settings.quality,
        state.settings.pagination_window,
    )
    .await?;

    Ok(Json(page))
}
