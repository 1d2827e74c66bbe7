use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{MovieDetails, MovieId, NOT_AVAILABLE};

/// One movie a user has added to their watchlist
///
/// Only `movie_id` is required. The catalog-derived fields (`title`,
/// `genres`, `rating`, `release_date`, `runtime_minutes`) are filled in by
/// the enrichment pipeline and are never removed once present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub movie_id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime_minutes: u32,
}

impl WatchlistEntry {
    /// Minimal entry created from an "add to watchlist" action
    pub fn new(movie_id: MovieId, title: Option<String>, poster_path: Option<String>) -> Self {
        Self {
            movie_id,
            title,
            poster_path,
            genres: Vec::new(),
            rating: None,
            release_date: None,
            runtime_minutes: 0,
        }
    }

    /// True when every catalog-derived field holds a real value.
    ///
    /// Complete entries are never re-fetched from the catalog.
    pub fn is_complete(&self) -> bool {
        has_value(self.title.as_deref())
            && self.genres.iter().any(|g| !g.trim().is_empty())
            && has_value(self.release_date.as_deref())
            && self.runtime_minutes > 0
    }

    /// Genre names joined for display, e.g. `Action, Drama`
    pub fn genre_label(&self) -> String {
        self.genres.join(", ")
    }

    /// Copy of this entry with catalog fields overwritten by `details`.
    ///
    /// A successful fetch is authoritative for title, genres, rating,
    /// release date and runtime. The poster path is only filled when
    /// missing so the one chosen at add time survives.
    pub fn enriched_with(&self, details: &MovieDetails) -> Self {
        let poster_path = self
            .poster_path
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| details.poster_path.clone());

        Self {
            movie_id: self.movie_id,
            title: Some(details.title.clone()),
            poster_path,
            genres: details.genre_names(),
            rating: Some(details.rating_label()),
            release_date: Some(details.release_date_label()),
            runtime_minutes: details.runtime.unwrap_or(0),
        }
    }
}

fn has_value(field: Option<&str>) -> bool {
    matches!(field.map(str::trim), Some(v) if !v.is_empty() && v != NOT_AVAILABLE)
}

/// Stored shape of a user's watchlist: `{ movies: [...] }`
///
/// `version` increases by one on every write so that observers can order
/// the documents they receive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchlistDocument {
    #[serde(default)]
    pub movies: Vec<WatchlistEntry>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WatchlistDocument {
    pub fn position(&self, movie_id: MovieId) -> Option<usize> {
        self.movies.iter().position(|m| m.movie_id == movie_id)
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.position(movie_id).is_some()
    }

    /// Replace the entry with the same id in place, or append
    pub fn upsert(&mut self, entry: WatchlistEntry) {
        match self.position(entry.movie_id) {
            Some(index) => self.movies[index] = entry,
            None => self.movies.push(entry),
        }
    }

    /// Returns whether an entry was removed
    pub fn remove(&mut self, movie_id: MovieId) -> bool {
        let before = self.movies.len();
        self.movies.retain(|m| m.movie_id != movie_id);
        self.movies.len() != before
    }

    /// Next revision of this document, stamped now
    pub fn next_revision(mut self) -> Self {
        self.version += 1;
        self.updated_at = Some(Utc::now());
        self
    }
}

/// Ordered, in-memory materialization of one user's watchlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchlistSnapshot {
    pub version: u64,
    pub entries: Vec<WatchlistEntry>,
}

impl WatchlistSnapshot {
    pub fn new(version: u64, entries: Vec<WatchlistEntry>) -> Self {
        Self { version, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<WatchlistDocument> for WatchlistSnapshot {
    fn from(document: WatchlistDocument) -> Self {
        Self {
            version: document.version,
            entries: document.movies,
        }
    }
}

/// Statistics derived from a snapshot; recomputed, never stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub movie_count: usize,
    pub total_runtime_minutes: u64,
    pub genre_counts: BTreeMap<String, u32>,
}

/// Watchlist state published to observers of a live sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchlistView {
    pub version: u64,
    /// False while catalog lookups for this version are still in flight
    pub enriched: bool,
    pub entries: Vec<WatchlistEntry>,
    pub stats: AggregateStats,
}
