use axum::{
    http::StatusCode,
    middleware,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::DocumentStore,
    middleware::{request_context::make_span_with_request_id, request_context_middleware},
    services::{enrichment::Enricher, providers::CatalogProvider, watchlist_store::WatchlistStore},
};

pub mod movies;
pub mod watchlist;

/// Shared application state
pub struct AppState {
    pub store: WatchlistStore,
    pub enricher: Enricher,
    pub catalog: Arc<dyn CatalogProvider>,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        catalog: Arc<dyn CatalogProvider>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store: WatchlistStore::new(documents),
            enricher: Enricher::new(Arc::clone(&catalog), fetch_timeout),
            catalog,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/watchlist",
            get(watchlist::list).post(watchlist::add),
        )
        .route("/watchlist/toggle", put(watchlist::toggle))
        .route("/watchlist/rows", get(watchlist::rows))
        .route("/watchlist/stats", get(watchlist::stats))
        .route("/watchlist/events", get(watchlist::events))
        .route(
            "/watchlist/:movie_id",
            get(watchlist::contains).delete(watchlist::remove),
        )
        .route("/home", get(movies::home))
        .route("/movies/search", get(movies::search))
        .route("/movies/:movie_id", get(movies::details))
        .route("/categories/:genre_id/movies", get(movies::category))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
