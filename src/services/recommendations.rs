use futures::future::join_all;
use std::collections::HashSet;

use crate::{
    db::InterestStore,
    error::{AppError, AppResult},
    models::{CatalogItem, Category, Interest},
    services::{
        normalize::normalize_page,
        providers::{CatalogFetcher, DiscoverFilters, FetchRequest, SortOrder},
        quality::{filter_batch, remember, QualityThresholds},
        ranking::merge_streams,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationSettings {
    pub limit: usize,
    pub quality: QualityThresholds,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            limit: 20,
            quality: QualityThresholds::default(),
        }
    }
}

/// One upstream query per interest, in interest order, without repeats
pub fn interest_requests(interests: &[Interest]) -> Vec<FetchRequest> {
    let mut seen = HashSet::new();

    interests
        .iter()
        .map(|interest| match interest {
            Interest::Genre { genre_id, category } => FetchRequest::Discover {
                category: *category,
                filters: DiscoverFilters {
                    genres: vec![*genre_id],
                    sort: SortOrder::VoteCount,
                    ..Default::default()
                },
            },
            Interest::Title { id, category } => FetchRequest::Similar {
                category: *category,
                id: *id,
            },
        })
        .filter(|request| seen.insert(request.clone()))
        .collect()
}

/// Generates personalized watch recommendations
///
/// Reads the user's interests, fans out one query per interest concurrently and
/// merges the first pages once all of them have settled. Titles the user
/// already declared interest in are never recommended back. Without usable
/// interests the trending movie list is ranked instead.
pub async fn get_recommendations(
    fetcher: &dyn CatalogFetcher,
    store: &dyn InterestStore,
    user_id: &str,
    settings: &RecommendationSettings,
) -> AppResult<Vec<CatalogItem>> {
    let interests = match store.interests_for(user_id).await {
        Ok(interests) => interests,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Interest read failed, skipping personalization");
            Vec::new()
        }
    };

    let mut requests = interest_requests(&interests);
    if requests.is_empty() {
        requests.push(FetchRequest::Trending {
            category: Category::Movie,
        });
    }

    let pages = join_all(requests.iter().map(|request| fetcher.fetch_page(request, 1))).await;

    let mut accepted: HashSet<_> = interests.iter().filter_map(Interest::title_key).collect();
    let mut streams = Vec::with_capacity(pages.len());
    let mut failures = 0;

    for (request, page) in requests.iter().zip(pages) {
        match page {
            Ok(raw) => {
                let kept = filter_batch(
                    normalize_page(&raw, request.category_hint()),
                    &accepted,
                    &settings.quality,
                );
                remember(&mut accepted, &kept);
                streams.push(kept);
            }
            Err(e) => {
                tracing::warn!(request = %request, error = %e, "Recommendation source failed");
                failures += 1;
            }
        }
    }

    if streams.is_empty() && failures > 0 {
        return Err(AppError::FetchFailure(
            "Failed to fetch any recommendation source".to_string(),
        ));
    }

    let mut recommendations = merge_streams(streams);
    recommendations.truncate(settings.limit);

    tracing::info!(
        user_id = %user_id,
        interests = interests.len(),
        sources = requests.len(),
        failed_sources = failures,
        results = recommendations.len(),
        "Recommendations computed"
    );

    Ok(recommendations)
}
