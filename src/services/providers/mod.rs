/// Catalog collaborator abstraction
///
/// The watchlist core only reads from the movie catalog: full details by id
/// for enrichment, plus the list endpoints the browse screens use. Keeping
/// this behind a trait lets the enrichment pipeline be exercised without a
/// network and lets another catalog be plugged in later.
use crate::{
    error::AppResult,
    models::{GenreList, MovieDetails, MovieId, MovieSummary, PagedResults},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch the full record for one movie
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieDetails>;

    /// Search movies by title
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>>;

    /// One page of movies in a genre
    ///
    /// With `alphabetical` the catalog orders the page by original title
    /// instead of popularity.
    async fn discover_by_genre(
        &self,
        genre_id: u32,
        page: u32,
        alphabetical: bool,
    ) -> AppResult<PagedResults<MovieSummary>>;

    /// One page of the currently most popular movies
    async fn popular(&self, page: u32) -> AppResult<PagedResults<MovieSummary>>;

    /// One page of movies now in theaters
    async fn now_playing(&self, page: u32) -> AppResult<PagedResults<MovieSummary>>;

    /// Genre id to name table
    async fn genres(&self) -> AppResult<GenreList>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
