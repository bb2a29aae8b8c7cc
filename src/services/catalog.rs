use serde::Serialize;
use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::ResultPage,
    services::{
        normalize::normalize_page,
        pagination::{pagination_window, PageToken},
        providers::{fetch_with_fallback, CatalogFetcher, FetchRequest},
        quality::{filter_batch, QualityThresholds},
    },
};

/// One browse page plus its navigation tokens
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BrowsePage {
    #[serde(flatten)]
    pub page: ResultPage,
    pub pagination: Vec<PageToken>,
}

/// Fetches a single catalog page, keeping the upstream order
pub async fn browse(
    fetcher: &dyn CatalogFetcher,
    request: &FetchRequest,
    page: u32,
    thresholds: &QualityThresholds,
    window: u32,
) -> AppResult<BrowsePage> {
    if page == 0 {
        return Err(AppError::InvalidInput("Pages start at 1".to_string()));
    }

    let raw = fetch_with_fallback(fetcher, request, page).await?;
    let items = filter_batch(
        normalize_page(&raw, request.category_hint()),
        &HashSet::new(),
        thresholds,
    );

    tracing::info!(
        request = %request,
        page = page,
        total_pages = raw.total_pages,
        results = items.len(),
        "Catalog page browsed"
    );

    Ok(BrowsePage {
        pagination: pagination_window(page, raw.total_pages, window),
        page: ResultPage {
            items,
            page,
            total_pages: raw.total_pages,
        },
    })
}
