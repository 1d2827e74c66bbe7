use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::MovieId;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Catalog lookup failed for movie {movie_id}: {reason}")]
    EntryFetchFailed { movie_id: MovieId, reason: String },

    #[error("Watchlist read failed: {0}")]
    StoreRead(String),

    #[error("Watchlist write failed: {0}")]
    StoreWrite(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::StoreRead(_) | AppError::StoreWrite(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ExternalApi(_)
            | AppError::HttpClient(_)
            | AppError::EntryFetchFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::Cache(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::ExternalApi(msg) => {
                msg
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authenticated_maps_to_401() {
        let response = AppError::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_store_failures_map_to_503() {
        let read = AppError::StoreRead("connection refused".to_string()).into_response();
        let write = AppError::StoreWrite("connection refused".to_string()).into_response();
        assert_eq!(read.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(write.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_entry_fetch_failed_message() {
        let err = AppError::EntryFetchFailed {
            movie_id: MovieId(42),
            reason: "timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Catalog lookup failed for movie 42: timed out"
        );
    }
}
