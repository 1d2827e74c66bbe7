//! Document collaborator: one watchlist document per user.
//!
//! Backends keep the whole `{ movies: [...] }` document under the user's
//! id, overwrite it on every write, and announce each written revision on a
//! per-user change feed so live observers see every change.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::{broadcast, RwLock};

use crate::{
    error::AppResult,
    models::{UserId, WatchlistDocument},
};

/// Buffered revisions per user before a slow observer starts lagging
pub(crate) const FEED_CAPACITY: usize = 16;

/// Per-user watchlist document storage with live change notification
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read; `None` when the user has never written a watchlist
    async fn read(&self, user: &UserId) -> AppResult<Option<WatchlistDocument>>;

    /// Overwrites the user's document and notifies watchers
    async fn write(&self, user: &UserId, document: &WatchlistDocument) -> AppResult<()>;

    /// Receiver for every document written after this call
    fn watch(&self, user: &UserId) -> broadcast::Receiver<WatchlistDocument>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Fan-out of written documents to the observers of each user
#[derive(Default)]
pub struct ChangeFeed {
    channels: Mutex<HashMap<UserId, broadcast::Sender<WatchlistDocument>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, user: &UserId) -> broadcast::Receiver<WatchlistDocument> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(user.clone())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, user: &UserId, document: &WatchlistDocument) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = channels.get(user) {
            if sender.send(document.clone()).is_err() {
                // nobody is listening any more
                channels.remove(user);
            }
        }
    }

    pub fn watcher_count(&self, user: &UserId) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.get(user).map_or(0, |s| s.receiver_count())
    }
}

/// Process-local document store for development and tests
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<UserId, WatchlistDocument>>,
    feed: ChangeFeed,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(&self, user: &UserId) -> AppResult<Option<WatchlistDocument>> {
        Ok(self.documents.read().await.get(user).cloned())
    }

    async fn write(&self, user: &UserId, document: &WatchlistDocument) -> AppResult<()> {
        self.documents
            .write()
            .await
            .insert(user.clone(), document.clone());
        self.feed.publish(user, document);
        Ok(())
    }

    fn watch(&self, user: &UserId) -> broadcast::Receiver<WatchlistDocument> {
        self.feed.subscribe(user)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
