use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieCard, MovieDetails, MovieId, MovieSummary},
    services::{
        layout::{pair_rows, Row},
        providers::CatalogProvider,
    },
};

pub const ACTION_GENRE_ID: u32 = 28;
pub const COMEDY_GENRE_ID: u32 = 35;

/// Popular movies shown in the home carousel
const TOP_PICKS_LIMIT: usize = 10;

/// Queries shorter than this return no results without hitting the catalog
const MIN_SEARCH_CHARS: usize = 3;

/// Everything the home screen shows, fetched in one go
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeFeed {
    pub top: Vec<MovieCard>,
    pub action: Vec<MovieCard>,
    pub comedy: Vec<MovieCard>,
    /// Now playing, two to a row
    pub latest: Vec<Row<MovieCard>>,
}

/// One loaded page of a genre category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPage {
    pub genre_id: u32,
    /// `None` when the catalog does not know the genre id
    pub genre_name: Option<String>,
    pub page: u32,
    pub letter: Option<char>,
    pub has_more: bool,
    pub movies: Vec<MovieCard>,
}

/// Parses the optional first-letter filter (`?letter=b`)
pub fn parse_letter(raw: Option<&str>) -> AppResult<Option<char>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(Some(c.to_ascii_uppercase())),
        _ => Err(AppError::InvalidInput(format!(
            "Letter filter must be a single letter A-Z, got {:?}",
            raw
        ))),
    }
}

/// Loads one catalog page for a genre, optionally narrowed to titles that
/// start with `letter`.
///
/// With a letter the catalog is asked for title ordering, then the page is
/// filtered locally, so a page can come back shorter than the catalog's page
/// size (or empty) while `has_more` is still true.
pub async fn browse_category(
    catalog: &dyn CatalogProvider,
    genre_id: u32,
    page: u32,
    letter: Option<char>,
) -> AppResult<CategoryPage> {
    if page == 0 {
        return Err(AppError::InvalidInput("Pages start at 1".to_string()));
    }

    let (listing, genres) = tokio::try_join!(
        catalog.discover_by_genre(genre_id, page, letter.is_some()),
        catalog.genres(),
    )?;
    let genre_names = genres.names_by_id();

    let movies: Vec<MovieCard> = listing
        .results
        .into_iter()
        .filter(|movie| match letter {
            Some(letter) => starts_with_letter(&movie.title, letter),
            None => true,
        })
        .map(|movie| MovieCard::from_summary(movie, &genre_names))
        .collect();

    tracing::debug!(
        genre_id,
        page,
        letter = ?letter,
        movies = movies.len(),
        "Category page loaded"
    );

    Ok(CategoryPage {
        genre_id,
        genre_name: genre_names.get(&genre_id).cloned(),
        page: listing.page,
        letter,
        has_more: listing.page < listing.total_pages,
        movies,
    })
}

fn starts_with_letter(title: &str, letter: char) -> bool {
    title
        .chars()
        .next()
        .is_some_and(|first| first.to_uppercase().eq(letter.to_uppercase()))
}

/// Loads the home screen lists concurrently.
///
/// Any failing list fails the whole feed.
pub async fn home_feed(catalog: &dyn CatalogProvider) -> AppResult<HomeFeed> {
    let (popular, action, comedy, now_playing, genres) = tokio::try_join!(
        catalog.popular(1),
        catalog.discover_by_genre(ACTION_GENRE_ID, 1, false),
        catalog.discover_by_genre(COMEDY_GENRE_ID, 1, false),
        catalog.now_playing(1),
        catalog.genres(),
    )?;
    let genre_names = genres.names_by_id();
    let cards = |movies: Vec<MovieSummary>| -> Vec<MovieCard> {
        movies
            .into_iter()
            .map(|movie| MovieCard::from_summary(movie, &genre_names))
            .collect()
    };

    let mut top = popular.results;
    top.truncate(TOP_PICKS_LIMIT);
    let latest = cards(now_playing.results);

    let feed = HomeFeed {
        top: cards(top),
        action: cards(action.results),
        comedy: cards(comedy.results),
        latest: pair_rows(&latest),
    };

    tracing::debug!(
        top = feed.top.len(),
        action = feed.action.len(),
        comedy = feed.comedy.len(),
        latest_rows = feed.latest.len(),
        "Home feed loaded"
    );

    Ok(feed)
}

/// Title search rendered as cards
///
/// Blank queries are rejected; one or two characters return nothing.
pub async fn search(catalog: &dyn CatalogProvider, query: &str) -> AppResult<Vec<MovieCard>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    if query.chars().count() < MIN_SEARCH_CHARS {
        return Ok(Vec::new());
    }

    let (results, genres) = tokio::try_join!(catalog.search_movies(query), catalog.genres())?;
    let genre_names = genres.names_by_id();

    Ok(results
        .into_iter()
        .map(|movie| MovieCard::from_summary(movie, &genre_names))
        .collect())
}

pub async fn movie_details(catalog: &dyn CatalogProvider, movie_id: MovieId) -> AppResult<MovieDetails> {
    catalog.fetch_movie(movie_id).await
}
