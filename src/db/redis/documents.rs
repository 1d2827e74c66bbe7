use redis::{AsyncCommands, Client};
use tokio::sync::broadcast;

use crate::{
    db::documents::{ChangeFeed, DocumentStore},
    error::{AppError, AppResult},
    models::{UserId, WatchlistDocument},
};

/// Watchlist documents stored as JSON strings under `watchlist:{user}`
pub struct RedisDocumentStore {
    redis_client: Client,
    feed: ChangeFeed,
}

impl RedisDocumentStore {
    pub fn new(redis_client: Client) -> Self {
        Self {
            redis_client,
            feed: ChangeFeed::new(),
        }
    }

    fn key(user: &UserId) -> String {
        format!("watchlist:{}", user)
    }
}

#[async_trait::async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn read(&self, user: &UserId) -> AppResult<Option<WatchlistDocument>> {
        let mut conn = self
            .redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))?;

        let raw: Option<String> = conn
            .get(Self::key(user))
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                tracing::error!(user_id = %user, error = %e, "Stored watchlist is not valid JSON");
                AppError::StoreRead(format!("Malformed watchlist document: {}", e))
            })
        })
        .transpose()
    }

    async fn write(&self, user: &UserId, document: &WatchlistDocument) -> AppResult<()> {
        let json = serde_json::to_string(document)
            .map_err(|e| AppError::StoreWrite(format!("Serialization error: {}", e)))?;

        let mut conn = self
            .redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::StoreWrite(e.to_string()))?;

        let _: () = conn
            .set(Self::key(user), json)
            .await
            .map_err(|e| AppError::StoreWrite(e.to_string()))?;

        tracing::debug!(
            user_id = %user,
            version = document.version,
            movies = document.movies.len(),
            "Watchlist document written"
        );

        self.feed.publish(user, document);
        Ok(())
    }

    fn watch(&self, user: &UserId) -> broadcast::Receiver<WatchlistDocument> {
        self.feed.subscribe(user)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
