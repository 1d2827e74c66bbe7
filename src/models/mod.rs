use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod catalog;
pub mod session;
pub mod watchlist;

pub use catalog::{Genre, GenreList, MovieCard, MovieDetails, MovieSummary, PagedResults};
pub use session::{Session, UserId};
pub use watchlist::{
    AggregateStats, WatchlistDocument, WatchlistEntry, WatchlistSnapshot, WatchlistView,
};

/// Marker the catalog-derived fields carry when the catalog has no value
pub const NOT_AVAILABLE: &str = "N/A";

/// Stable catalog identifier for a movie (TMDB id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
