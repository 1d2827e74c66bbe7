use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use nightverse_api::{
    config::{Config, StorageBackend},
    db::{create_redis_client, Cache, DocumentStore, InMemoryDocumentStore, RedisDocumentStore},
    routes::{create_router, AppState},
    services::providers::{CatalogProvider, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nightverse_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client.clone());

    let catalog: Arc<dyn CatalogProvider> = Arc::new(TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));

    let documents: Arc<dyn DocumentStore> = match config.storage_backend {
        StorageBackend::Redis => Arc::new(RedisDocumentStore::new(redis_client)),
        StorageBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
    };

    tracing::info!(
        catalog = catalog.name(),
        documents = documents.name(),
        catalog_timeout_secs = config.catalog_timeout_secs,
        "Services initialized"
    );

    let state = AppState::new(documents, catalog, config.catalog_timeout());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
