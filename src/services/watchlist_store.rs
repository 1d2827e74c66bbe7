use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::{
    db::DocumentStore,
    error::AppResult,
    models::{MovieId, Session, UserId, WatchlistDocument, WatchlistEntry, WatchlistSnapshot},
};

type SnapshotCallback = Box<dyn Fn(WatchlistSnapshot) + Send + Sync + 'static>;

/// Owner of each user's canonical watchlist
///
/// The whole list lives in one document per user. Every mutation is a
/// read-modify-write of that document, serialized per user so two requests
/// from the same process cannot interleave on one list while different
/// users never wait on each other.
pub struct WatchlistStore {
    documents: Arc<dyn DocumentStore>,
    write_locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl WatchlistStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock guarding read-modify-write of one user's document
    fn write_lock(&self, user: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.write_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // forget locks nobody holds or waits on
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(user.clone()).or_default())
    }

    async fn load(&self, user: &UserId) -> AppResult<WatchlistDocument> {
        Ok(self.documents.read(user).await?.unwrap_or_default())
    }

    async fn save(&self, user: &UserId, document: WatchlistDocument) -> AppResult<WatchlistDocument> {
        let document = document.next_revision();
        self.documents.write(user, &document).await?;
        Ok(document)
    }

    /// Current snapshot; empty when the user has no document yet
    pub async fn snapshot(&self, session: &Session) -> AppResult<WatchlistSnapshot> {
        let user = session.user()?;
        Ok(self.load(user).await?.into())
    }

    /// Inserts `entry`, replacing any entry with the same movie id
    pub async fn add(&self, session: &Session, entry: WatchlistEntry) -> AppResult<WatchlistSnapshot> {
        let user = session.user()?;
        let movie_id = entry.movie_id;

        let lock = self.write_lock(user);
        let _guard = lock.lock().await;
        let mut document = self.load(user).await?;
        let replaced = document.contains(movie_id);
        document.upsert(entry);
        let document = self.save(user, document).await?;

        tracing::info!(
            user_id = %user,
            movie_id = %movie_id,
            replaced,
            version = document.version,
            "Movie added to watchlist"
        );

        Ok(document.into())
    }

    /// Removes the entry for `movie_id`; absent ids leave the document untouched
    pub async fn remove(&self, session: &Session, movie_id: MovieId) -> AppResult<WatchlistSnapshot> {
        let user = session.user()?;

        let lock = self.write_lock(user);
        let _guard = lock.lock().await;
        let mut document = self.load(user).await?;
        if !document.remove(movie_id) {
            tracing::debug!(user_id = %user, movie_id = %movie_id, "Movie not in watchlist, nothing to remove");
            return Ok(document.into());
        }
        let document = self.save(user, document).await?;

        tracing::info!(
            user_id = %user,
            movie_id = %movie_id,
            version = document.version,
            "Movie removed from watchlist"
        );

        Ok(document.into())
    }

    /// Adds `entry` when absent, removes it when present.
    ///
    /// Returns whether the movie is in the watchlist afterwards.
    pub async fn toggle(&self, session: &Session, entry: WatchlistEntry) -> AppResult<bool> {
        let user = session.user()?;
        let movie_id = entry.movie_id;

        let lock = self.write_lock(user);
        let _guard = lock.lock().await;
        let mut document = self.load(user).await?;
        let now_present = if document.remove(movie_id) {
            false
        } else {
            document.upsert(entry);
            true
        };
        let document = self.save(user, document).await?;

        tracing::info!(
            user_id = %user,
            movie_id = %movie_id,
            in_watchlist = now_present,
            version = document.version,
            "Watchlist membership toggled"
        );

        Ok(now_present)
    }

    /// Point-in-time membership check
    pub async fn contains(&self, session: &Session, movie_id: MovieId) -> AppResult<bool> {
        let user = session.user()?;
        Ok(self.load(user).await?.contains(movie_id))
    }

    /// Registers a live observer of the user's watchlist.
    ///
    /// `callback` runs once before this returns with the current snapshot
    /// (empty if the user has no document) and then once per later revision,
    /// in version order. Dropping or cancelling the returned `Subscription`
    /// guarantees no further invocations. The callback must not cancel its
    /// own subscription.
    pub async fn subscribe<F>(&self, session: &Session, callback: F) -> AppResult<Subscription>
    where
        F: Fn(WatchlistSnapshot) + Send + Sync + 'static,
    {
        let user = session.user()?.clone();

        // Watch before reading so a write landing in between is not lost
        let mut changes = self.documents.watch(&user);
        let initial = self.load(&user).await?;

        let callback: SnapshotCallback = Box::new(callback);
        let slot = Arc::new(Mutex::new(Some(callback)));
        let mut delivered = initial.version;
        deliver(&slot, initial.into());

        let documents = Arc::clone(&self.documents);
        let task_slot = Arc::clone(&slot);
        let task = tokio::spawn(async move {
            loop {
                let document = match changes.recv().await {
                    Ok(document) => document,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(user_id = %user, skipped, "Watchlist observer lagged, re-reading");
                        match documents.read(&user).await {
                            Ok(document) => document.unwrap_or_default(),
                            Err(e) => {
                                tracing::warn!(user_id = %user, error = %e, "Re-read after lag failed");
                                continue;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                };

                if document.version <= delivered {
                    continue;
                }
                delivered = document.version;

                if !deliver(&task_slot, document.into()) {
                    break;
                }
            }
        });

        tracing::debug!(backend = self.documents.name(), "Watchlist subscription started");

        Ok(Subscription { slot, task })
    }
}

/// Runs the callback if the subscription is still live
fn deliver(slot: &Mutex<Option<SnapshotCallback>>, snapshot: WatchlistSnapshot) -> bool {
    let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    match guard.as_ref() {
        Some(callback) => {
            callback(snapshot);
            true
        }
        None => false,
    }
}

/// Handle to a live watchlist observer; cancels on drop
pub struct Subscription {
    slot: Arc<Mutex<Option<SnapshotCallback>>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stops delivery. Once this returns the callback will not run again.
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Taking the callback waits out any in-progress delivery
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.task.abort();
    }
}
