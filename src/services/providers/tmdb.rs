/// TMDB (The Movie Database) catalog provider
///
/// Endpoints used:
/// 1. Details: /movie/{id}
/// 2. Search: /search/movie?query=
/// 3. Category pages: /discover/movie?with_genres=&page=
/// 4. Home lists: /movie/popular and /movie/now_playing
/// 5. Genre names: /genre/movie/list
///
/// Every response goes through the Redis cache first.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{GenreList, MovieDetails, MovieId, MovieSummary, PagedResults},
    services::providers::CatalogProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
const LIST_CACHE_TTL: u64 = 3600; // 1 hour
const GENRES_CACHE_TTL: u64 = 604800; // 1 week
const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// GET `{api_url}{path}` with credentials and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB has no resource at {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

fn discover_params(genre_id: u32, page: u32, alphabetical: bool) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("with_genres", genre_id.to_string()),
        ("page", page.to_string()),
    ];
    if alphabetical {
        params.push(("sort_by", "original_title.asc".to_string()));
    }
    params
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(movie_id),
            DETAILS_CACHE_TTL,
            async move {
                let details: MovieDetails =
                    self.get_json(&format!("/movie/{}", movie_id), &[]).await?;

                tracing::debug!(
                    movie_id = %movie_id,
                    provider = "tmdb",
                    "Movie details fetched"
                );

                Ok::<_, AppError>(details)
            }
        )
    }

    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            LIST_CACHE_TTL,
            async move {
                let paged: PagedResults<MovieSummary> = self
                    .get_json("/search/movie", &[("query", query.trim().to_string())])
                    .await?;

                tracing::info!(
                    query = %query,
                    results = paged.results.len(),
                    provider = "tmdb",
                    "Title search completed"
                );

                Ok::<_, AppError>(paged.results)
            }
        )
    }

    async fn discover_by_genre(
        &self,
        genre_id: u32,
        page: u32,
        alphabetical: bool,
    ) -> AppResult<PagedResults<MovieSummary>> {
        cached!(
            self.cache,
            CacheKey::Discover {
                genre_id,
                page,
                alphabetical,
            },
            LIST_CACHE_TTL,
            async move {
                let params = discover_params(genre_id, page, alphabetical);
                let paged: PagedResults<MovieSummary> =
                    self.get_json("/discover/movie", &params).await?;

                tracing::debug!(
                    genre_id,
                    page,
                    results = paged.results.len(),
                    provider = "tmdb",
                    "Category page fetched"
                );

                Ok::<_, AppError>(paged)
            }
        )
    }

    async fn popular(&self, page: u32) -> AppResult<PagedResults<MovieSummary>> {
        cached!(self.cache, CacheKey::Popular { page }, LIST_CACHE_TTL, async move {
            self.get_json::<PagedResults<MovieSummary>>("/movie/popular", &[("page", page.to_string())])
                .await
        })
    }

    async fn now_playing(&self, page: u32) -> AppResult<PagedResults<MovieSummary>> {
        cached!(self.cache, CacheKey::NowPlaying { page }, LIST_CACHE_TTL, async move {
            self.get_json::<PagedResults<MovieSummary>>("/movie/now_playing", &[("page", page.to_string())])
                .await
        })
    }

    async fn genres(&self) -> AppResult<GenreList> {
        cached!(self.cache, CacheKey::Genres, GENRES_CACHE_TTL, async move {
            self.get_json::<GenreList>("/genre/movie/list", &[]).await
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
