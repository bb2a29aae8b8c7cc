//! Scripted catalog fetcher for tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

use crate::{
    error::{AppError, AppResult},
    models::{Category, Genre, RawPage},
    services::providers::{CatalogFetcher, FetchRequest},
};

/// [`CatalogFetcher`] that serves pages registered up front
///
/// - pages are keyed by request and page number; unscripted pages fail
/// - every `fetch_page` call is recorded before it is served
/// - a gated fetcher blocks each call until [`ScriptedFetcher::release`]
///
/// ```rust,ignore
/// let fetcher = ScriptedFetcher::new();
/// fetcher.set_page(&request, 1, 2, vec![movie_json(1, 100, 7.5)]).await;
/// let page = fetcher.fetch_page(&request, 1).await?;
/// ```
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    pages: RwLock<HashMap<(FetchRequest, u32), RawPage>>,
    failures: RwLock<HashSet<(FetchRequest, u32)>>,
    genres: RwLock<HashMap<Category, Vec<Genre>>>,
    failing_genres: RwLock<HashSet<Category>>,
    calls: RwLock<Vec<(FetchRequest, u32)>>,
    genre_calls: RwLock<Vec<Category>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher whose calls wait until permits are released
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Lets `permits` blocked or future calls through
    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub async fn set_page(
        &self,
        request: &FetchRequest,
        page: u32,
        total_pages: u32,
        results: Vec<Value>,
    ) {
        let key = (request.clone(), page);
        self.failures.write().await.remove(&key);
        self.pages.write().await.insert(
            key,
            RawPage {
                page,
                total_pages,
                results,
            },
        );
    }

    pub async fn fail_page(&self, request: &FetchRequest, page: u32) {
        let key = (request.clone(), page);
        self.pages.write().await.remove(&key);
        self.failures.write().await.insert(key);
    }

    pub async fn set_genres(&self, category: Category, genres: Vec<Genre>) {
        self.failing_genres.write().await.remove(&category);
        self.genres.write().await.insert(category, genres);
    }

    pub async fn fail_genres(&self, category: Category) {
        self.failing_genres.write().await.insert(category);
    }

    pub async fn calls(&self) -> Vec<(FetchRequest, u32)> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn genre_call_count(&self) -> usize {
        self.genre_calls.read().await.len()
    }

    async fn wait_for_gate(&self) -> AppResult<()> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?
                .forget();
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogFetcher for ScriptedFetcher {
    async fn fetch_page(&self, request: &FetchRequest, page: u32) -> AppResult<RawPage> {
        self.calls.write().await.push((request.clone(), page));
        self.wait_for_gate().await?;

        let key = (request.clone(), page);
        if self.failures.read().await.contains(&key) {
            return Err(AppError::FetchFailure(format!(
                "scripted failure for {} page {}",
                request, page
            )));
        }

        self.pages.read().await.get(&key).cloned().ok_or_else(|| {
            AppError::FetchFailure(format!("no scripted page for {} page {}", request, page))
        })
    }

    async fn fetch_genres(&self, category: Category) -> AppResult<Vec<Genre>> {
        self.genre_calls.write().await.push(category);

        if self.failing_genres.read().await.contains(&category) {
            return Err(AppError::FetchFailure(format!(
                "scripted genre failure for {}",
                category
            )));
        }

        Ok(self
            .genres
            .read()
            .await
            .get(&category)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Upstream-shaped movie item with a poster
pub fn movie_json(id: u64, vote_count: u32, vote_average: f64) -> Value {
    json!({
        "id": id,
        "media_type": "movie",
        "title": format!("Movie {}", id),
        "poster_path": format!("/movie{}.jpg", id),
        "popularity": 10.0,
        "vote_average": vote_average,
        "vote_count": vote_count,
        "release_date": "2020-01-01",
    })
}

/// Upstream-shaped series item with a poster
pub fn series_json(id: u64, vote_count: u32, vote_average: f64) -> Value {
    json!({
        "id": id,
        "media_type": "tv",
        "name": format!("Series {}", id),
        "poster_path": format!("/tv{}.jpg", id),
        "popularity": 10.0,
        "vote_average": vote_average,
        "vote_count": vote_count,
        "first_air_date": "2019-06-01",
    })
}

/// Upstream-shaped person item, never displayable
pub fn person_json(id: u64) -> Value {
    json!({
        "id": id,
        "media_type": "person",
        "name": format!("Person {}", id),
        "profile_path": format!("/person{}.jpg", id),
    })
}
