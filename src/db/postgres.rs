use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{Interest, InterestRow},
};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Read access to the interests a user declared
///
/// Reads are all-or-nothing: any failure is returned as an error and callers
/// treat it as "no personalization" rather than working from a partial list.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InterestStore: Send + Sync {
    async fn interests_for(&self, user_id: &str) -> AppResult<Vec<Interest>>;
}

/// Interest store backed by the `user_interests` table
#[derive(Clone)]
pub struct PgInterestStore {
    pool: PgPool,
}

impl PgInterestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InterestStore for PgInterestStore {
    async fn interests_for(&self, user_id: &str) -> AppResult<Vec<Interest>> {
        let rows = sqlx::query_as::<_, InterestRow>(
            r#"
            SELECT kind, reference_id, category
            FROM user_interests
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let interests = interests_from_rows(rows).map_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Unreadable interest row");
            e
        })?;

        tracing::debug!(user_id = %user_id, interests = interests.len(), "Interests loaded");

        Ok(interests)
    }
}

/// Converts every row or fails; a partial interest list is never returned
fn interests_from_rows(rows: Vec<InterestRow>) -> AppResult<Vec<Interest>> {
    rows.into_iter()
        .map(|row| {
            Interest::try_from(row)
                .map_err(|reason| AppError::Internal(format!("Invalid interest row: {}", reason)))
        })
        .collect()
}
