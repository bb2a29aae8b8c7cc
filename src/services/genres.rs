use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;

use crate::{
    error::{AppError, AppResult},
    models::Category,
    services::providers::CatalogFetcher,
};

/// Genre id to name lookup for both categories
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GenreTable {
    pub movie: BTreeMap<u32, String>,
    pub tv: BTreeMap<u32, String>,
}

impl GenreTable {
    pub fn name(&self, category: Category, genre_id: u32) -> Option<&str> {
        let table = match category {
            Category::Movie => &self.movie,
            Category::Series => &self.tv,
        };
        table.get(&genre_id).map(String::as_str)
    }
}

/// Process-lifetime genre taxonomy, loaded on first use
///
/// The taxonomy is treated as static: once loaded it is never refreshed. A
/// failed load is not remembered, so the next caller tries again.
#[derive(Debug, Default)]
pub struct GenreDirectory {
    table: OnceCell<GenreTable>,
}

impl GenreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, fetcher: &dyn CatalogFetcher) -> AppResult<&GenreTable> {
        self.table
            .get_or_try_init(|| async {
                let (movie, tv) = tokio::try_join!(
                    fetcher.fetch_genres(Category::Movie),
                    fetcher.fetch_genres(Category::Series),
                )?;

                tracing::info!(
                    movie_genres = movie.len(),
                    tv_genres = tv.len(),
                    "Genre directory loaded"
                );

                Ok::<_, AppError>(GenreTable {
                    movie: movie.into_iter().map(|g| (g.id, g.name)).collect(),
                    tv: tv.into_iter().map(|g| (g.id, g.name)).collect(),
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Genre;
    use crate::testing::ScriptedFetcher;
    use tokio_test::{assert_err, assert_ok};

    fn genre(id: u32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let fetcher = ScriptedFetcher::new();
        fetcher
            .set_genres(Category::Movie, vec![genre(28, "Action"), genre(18, "Drama")])
            .await;
        fetcher
            .set_genres(Category::Series, vec![genre(10765, "Sci-Fi & Fantasy"), genre(18, "Drama")])
            .await;

        let directory = GenreDirectory::new();
        let table = directory.get(&fetcher).await.unwrap();
        assert_eq!(table.name(Category::Movie, 28), Some("Action"));
        assert_eq!(table.name(Category::Series, 10765), Some("Sci-Fi & Fantasy"));
        assert_eq!(table.name(Category::Series, 28), None);

        directory.get(&fetcher).await.unwrap();
        assert_eq!(fetcher.genre_call_count().await, 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let fetcher = ScriptedFetcher::new();
        fetcher.set_genres(Category::Movie, vec![genre(28, "Action")]).await;
        fetcher.fail_genres(Category::Series).await;

        let directory = GenreDirectory::new();
        assert_err!(directory.get(&fetcher).await);

        fetcher.set_genres(Category::Series, vec![genre(18, "Drama")]).await;
        let table = assert_ok!(directory.get(&fetcher).await);
        assert_eq!(table.tv.len(), 1);
    }
}
