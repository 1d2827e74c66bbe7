use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};

use crate::{
    error::AppResult,
    middleware::RequestContext,
    models::{AggregateStats, MovieId, WatchlistEntry, WatchlistSnapshot},
    routes::AppState,
    services::{
        aggregator::aggregate,
        layout::{pair_rows, Row},
        sync::WatchlistSync,
    },
};

/// Body of an add/toggle: what the client knows when the user taps the heart
#[derive(Debug, Deserialize)]
pub struct WatchlistItemRequest {
    pub id: MovieId,
    pub title: Option<String>,
    pub poster_path: Option<String>,
}

impl From<WatchlistItemRequest> for WatchlistEntry {
    fn from(request: WatchlistItemRequest) -> Self {
        WatchlistEntry::new(request.id, request.title, request.poster_path)
    }
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub version: u64,
    pub entries: Vec<WatchlistEntry>,
    pub stats: AggregateStats,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub movie_id: MovieId,
    pub in_watchlist: bool,
}

async fn enriched_snapshot(state: &AppState, ctx: &RequestContext) -> AppResult<WatchlistSnapshot> {
    let snapshot = state.store.snapshot(&ctx.session).await?;
    Ok(state.enricher.enrich(snapshot).await)
}

/// Enriched watchlist with its statistics
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<WatchlistResponse>> {
    let snapshot = enriched_snapshot(&state, &ctx).await?;
    let stats = aggregate(&snapshot);

    Ok(Json(WatchlistResponse {
        version: snapshot.version,
        entries: snapshot.entries,
        stats,
    }))
}

/// Enriched watchlist laid out two per row
pub async fn rows(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<Row<WatchlistEntry>>>> {
    let snapshot = enriched_snapshot(&state, &ctx).await?;
    Ok(Json(pair_rows(&snapshot.entries)))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<AggregateStats>> {
    let snapshot = enriched_snapshot(&state, &ctx).await?;
    Ok(Json(aggregate(&snapshot)))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<WatchlistItemRequest>,
) -> AppResult<(StatusCode, Json<WatchlistSnapshot>)> {
    tracing::info!(
        request_id = %ctx.request_id,
        movie_id = %request.id,
        "Adding movie to watchlist"
    );

    let snapshot = state.store.add(&ctx.session, request.into()).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<WatchlistItemRequest>,
) -> AppResult<Json<MembershipResponse>> {
    let movie_id = request.id;
    let in_watchlist = state.store.toggle(&ctx.session, request.into()).await?;

    Ok(Json(MembershipResponse {
        movie_id,
        in_watchlist,
    }))
}

pub async fn contains(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MembershipResponse>> {
    let movie_id = MovieId(movie_id);
    let in_watchlist = state.store.contains(&ctx.session, movie_id).await?;

    Ok(Json(MembershipResponse {
        movie_id,
        in_watchlist,
    }))
}

/// Removes a movie; succeeds whether or not it was present
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(movie_id): Path<u64>,
) -> AppResult<StatusCode> {
    state.store.remove(&ctx.session, MovieId(movie_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Server-sent events: one `watchlist` event per published view
pub async fn events(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let sync = WatchlistSync::start(&state.store, state.enricher.clone(), &ctx.session).await?;

    tracing::info!(request_id = %ctx.request_id, "Watchlist event stream opened");

    let views = WatchStream::new(sync.view());
    let stream = views.map(move |view| {
        // the stream owns the sync; dropping the connection cancels it
        let _live = &sync;
        Event::default().event("watchlist").json_data(&view)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
