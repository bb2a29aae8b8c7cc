/// Catalog data provider abstraction
///
/// Every upstream list endpoint (search, discover by genre or provider, per-title
/// recommendations, trending) goes through one parameterized capability, so the
/// aggregation stages never care which endpoint produced a page.
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{Category, Genre, RawPage},
};

pub mod tmdb;

pub use tmdb::TmdbFetcher;

/// Upstream sort orders supported by discover queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Popularity,
    VoteCount,
    ReleaseDate,
}

impl SortOrder {
    /// Value of TMDB's `sort_by` parameter for a category
    pub fn as_param(&self, category: Category) -> &'static str {
        match (self, category) {
            (SortOrder::Popularity, _) => "popularity.desc",
            (SortOrder::VoteCount, _) => "vote_count.desc",
            (SortOrder::ReleaseDate, Category::Movie) => "primary_release_date.desc",
            (SortOrder::ReleaseDate, Category::Series) => "first_air_date.desc",
        }
    }
}

/// What to do when a discover query comes back empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    None,
    /// Re-run the same filters sorted by popularity
    PopularityIfEmpty,
}

/// Filter set for discover queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoverFilters {
    #[serde(default)]
    pub genres: Vec<u32>,
    #[serde(default)]
    pub watch_providers: Vec<u32>,
    #[serde(default)]
    pub watch_region: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

/// One parameterized upstream list query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchRequest {
    /// Free-text search across movies, series and people
    Search { query: String },
    /// Filtered listing for one category
    Discover {
        category: Category,
        filters: DiscoverFilters,
    },
    /// Titles the catalog relates to one title
    Similar { category: Category, id: u64 },
    /// Weekly trending list for one category
    Trending { category: Category },
}

impl FetchRequest {
    /// Category implied by the endpoint when items carry no `media_type`
    pub fn category_hint(&self) -> Option<Category> {
        match self {
            FetchRequest::Search { .. } => None,
            FetchRequest::Discover { category, .. }
            | FetchRequest::Similar { category, .. }
            | FetchRequest::Trending { category } => Some(*category),
        }
    }

    /// The fallback query to run when this one returns nothing
    pub fn fallback(&self) -> Option<FetchRequest> {
        match self {
            FetchRequest::Discover { category, filters }
                if filters.fallback == FallbackPolicy::PopularityIfEmpty
                    && filters.sort != SortOrder::Popularity =>
            {
                Some(FetchRequest::Discover {
                    category: *category,
                    filters: DiscoverFilters {
                        sort: SortOrder::Popularity,
                        fallback: FallbackPolicy::None,
                        ..filters.clone()
                    },
                })
            }
            _ => None,
        }
    }
}

impl Display for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchRequest::Search { query } => write!(f, "search:{}", query.trim().to_lowercase()),
            FetchRequest::Discover { category, filters } => write!(
                f,
                "discover:{}:g={:?}:p={:?}:r={}:s={}",
                category,
                filters.genres,
                filters.watch_providers,
                filters.watch_region.as_deref().unwrap_or("-"),
                filters.sort.as_param(*category),
            ),
            FetchRequest::Similar { category, id } => write!(f, "similar:{}:{}", category, id),
            FetchRequest::Trending { category } => write!(f, "trending:{}", category),
        }
    }
}

/// Trait for catalog data providers
///
/// Implementations must report network and HTTP failures as
/// [`crate::error::AppError::FetchFailure`] and must be safe to call again with
/// the same arguments. Retrying is the caller's decision.
#[async_trait::async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch one page (1-indexed) of a list query
    async fn fetch_page(&self, request: &FetchRequest, page: u32) -> AppResult<RawPage>;

    /// Fetch the genre taxonomy for one category
    async fn fetch_genres(&self, category: Category) -> AppResult<Vec<Genre>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Fetches a page, applying the request's fallback policy when it is empty
pub async fn fetch_with_fallback(
    fetcher: &dyn CatalogFetcher,
    request: &FetchRequest,
    page: u32,
) -> AppResult<RawPage> {
    let raw = fetcher.fetch_page(request, page).await?;

    if !raw.results.is_empty() {
        return Ok(raw);
    }

    match request.fallback() {
        Some(fallback) => {
            tracing::info!(
                request = %request,
                fallback = %fallback,
                provider = fetcher.name(),
                "Empty result page, using fallback query"
            );
            fetcher.fetch_page(&fallback, page).await
        }
        None => Ok(raw),
    }
}
