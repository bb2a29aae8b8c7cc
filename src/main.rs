use std::sync::Arc;

use catalog_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, PgInterestStore},
    routes::{create_router, AppState},
    services::providers::TmdbFetcher,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let fetcher = TmdbFetcher::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.catalog_cache_ttl,
    )?;

    let state = AppState::new(
        Arc::new(fetcher),
        Arc::new(PgInterestStore::new(pool)),
        config.app_settings(),
    );
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}
