/// TMDB catalog provider
///
/// Serves every list query through the v3 REST API:
/// - Search: /search/multi (movies, series and people mixed)
/// - Discover: /discover/{movie,tv} with genre/provider/region filters
/// - Similar: /{movie,tv}/{id}/recommendations
/// - Trending: /trending/{movie,tv}/week
///
/// Pages are cached in Redis keyed by the request and page number.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Category, Genre, RawPage},
    services::providers::{CatalogFetcher, FetchRequest},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const GENRE_CACHE_TTL: u64 = 604800; // 1 week
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// TMDB rejects page numbers above this
const MAX_UPSTREAM_PAGE: u32 = 500;

#[derive(Clone)]
pub struct TmdbFetcher {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
    page_ttl: u64,
}

impl TmdbFetcher {
    pub fn new(cache: Cache, api_key: String, api_url: String, page_ttl: u64) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::InvalidInput("TMDB API key is required".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            page_ttl,
        })
    }

    /// Endpoint path and extra query parameters for a list request
    fn endpoint(&self, request: &FetchRequest) -> (String, Vec<(&'static str, String)>) {
        match request {
            FetchRequest::Search { query } => (
                format!("{}/search/multi", self.api_url),
                vec![
                    ("query", query.trim().to_string()),
                    ("include_adult", "false".to_string()),
                ],
            ),
            FetchRequest::Discover { category, filters } => {
                let mut params = vec![("sort_by", filters.sort.as_param(*category).to_string())];
                if !filters.genres.is_empty() {
                    params.push(("with_genres", join_ids(&filters.genres, ",")));
                }
                if !filters.watch_providers.is_empty() {
                    params.push(("with_watch_providers", join_ids(&filters.watch_providers, "|")));
                    params.push((
                        "watch_region",
                        filters.watch_region.clone().unwrap_or_else(|| "US".to_string()),
                    ));
                }
                (
                    format!("{}/discover/{}", self.api_url, category.as_path()),
                    params,
                )
            }
            FetchRequest::Similar { category, id } => (
                format!("{}/{}/{}/recommendations", self.api_url, category.as_path(), id),
                vec![],
            ),
            FetchRequest::Trending { category } => (
                format!("{}/trending/{}/week", self.api_url, category.as_path()),
                vec![],
            ),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::FetchFailure("Invalid TMDB API key".to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::FetchFailure(
                "TMDB rate limit exceeded".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::FetchFailure(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to deserialize TMDB response");
            AppError::FetchFailure(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

fn join_ids(ids: &[u32], separator: &str) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[async_trait::async_trait]
impl CatalogFetcher for TmdbFetcher {
    async fn fetch_page(&self, request: &FetchRequest, page: u32) -> AppResult<RawPage> {
        if let FetchRequest::Search { query } = request {
            if query.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "Search query cannot be empty".to_string(),
                ));
            }
        }
        if page == 0 || page > MAX_UPSTREAM_PAGE {
            return Err(AppError::InvalidInput(format!(
                "Page {} outside 1..={}",
                page, MAX_UPSTREAM_PAGE
            )));
        }

        cached!(
            self.cache,
            CacheKey::CatalogPage(request.to_string(), page),
            self.page_ttl,
            async move {
                let (url, mut params) = self.endpoint(request);
                params.push(("page", page.to_string()));

                let mut raw: RawPage = self.get_json(&url, &params).await?;
                raw.total_pages = raw.total_pages.min(MAX_UPSTREAM_PAGE);

                tracing::info!(
                    request = %request,
                    page = page,
                    total_pages = raw.total_pages,
                    results = raw.results.len(),
                    provider = "tmdb",
                    "Catalog page fetched"
                );

                Ok::<_, AppError>(raw)
            }
        )
    }

    async fn fetch_genres(&self, category: Category) -> AppResult<Vec<Genre>> {
        cached!(
            self.cache,
            CacheKey::GenreList(category),
            GENRE_CACHE_TTL,
            async move {
                let url = format!("{}/genre/{}/list", self.api_url, category.as_path());
                let response: GenreListResponse = self.get_json(&url, &[]).await?;

                tracing::info!(
                    category = %category,
                    genres = response.genres.len(),
                    provider = "tmdb",
                    "Genre list fetched"
                );

                Ok::<_, AppError>(response.genres)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
