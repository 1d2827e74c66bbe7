use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{MovieId, NOT_AVAILABLE};

// ============================================================================
// TMDB API Types
// ============================================================================

/// Full movie record from GET /movie/{id}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MovieDetails {
    pub fn genre_names(&self) -> Vec<String> {
        self.genres
            .iter()
            .map(|g| g.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Vote average to one decimal, or `N/A`
    pub fn rating_label(&self) -> String {
        format_rating(self.vote_average)
    }

    /// Release date, or `N/A` when the catalog has none
    pub fn release_date_label(&self) -> String {
        match self.release_date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => date.to_string(),
            _ => NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Response from GET /genre/movie/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}

impl GenreList {
    pub fn names_by_id(&self) -> HashMap<u32, String> {
        self.genres
            .iter()
            .map(|g| (g.id, g.name.clone()))
            .collect()
    }
}

/// Movie as it appears in TMDB list endpoints (search, discover, now playing)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

/// TMDB paginated list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResults<T> {
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
}

// ============================================================================
// Client-facing types
// ============================================================================

/// Number of genre names shown on a card
const CARD_GENRE_LIMIT: usize = 2;

/// A list result ready for display: rating formatted, genre ids resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: String,
    pub release_date: String,
    pub genres: Vec<String>,
}

impl MovieCard {
    pub fn from_summary(summary: MovieSummary, genre_names: &HashMap<u32, String>) -> Self {
        let genres = summary
            .genre_ids
            .iter()
            .filter_map(|id| genre_names.get(id).cloned())
            .take(CARD_GENRE_LIMIT)
            .collect();

        let release_date = match summary.release_date {
            Some(date) if !date.trim().is_empty() => date,
            _ => NOT_AVAILABLE.to_string(),
        };

        Self {
            id: summary.id,
            title: summary.title,
            poster_path: summary.poster_path,
            rating: format_rating(summary.vote_average),
            release_date,
            genres,
        }
    }
}

pub(crate) fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v.is_finite() => format!("{:.1}", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}
