use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MovieCard, MovieDetails, MovieId},
    routes::AppState,
    services::browse::{self, CategoryPage, HomeFeed},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default = "first_page")]
    page: u32,
    letter: Option<String>,
}

fn first_page() -> u32 {
    1
}

/// Handler for the home screen lists
pub async fn home(State(state): State<Arc<AppState>>) -> AppResult<Json<HomeFeed>> {
    let feed = browse::home_feed(state.catalog.as_ref()).await?;
    Ok(Json(feed))
}

/// Handler for title search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let cards = browse::search(state.catalog.as_ref(), &params.q).await?;
    Ok(Json(cards))
}

pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MovieDetails>> {
    let details = browse::movie_details(state.catalog.as_ref(), MovieId(movie_id)).await?;
    Ok(Json(details))
}

/// Handler for a genre category page with optional first-letter filter
pub async fn category(
    State(state): State<Arc<AppState>>,
    Path(genre_id): Path<u32>,
    Query(params): Query<CategoryQuery>,
) -> AppResult<Json<CategoryPage>> {
    let letter = browse::parse_letter(params.letter.as_deref())?;
    let page = browse::browse_category(state.catalog.as_ref(), genre_id, params.page, letter).await?;
    Ok(Json(page))
}
