use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MovieId, WatchlistEntry, WatchlistSnapshot},
    services::providers::CatalogProvider,
};

/// Fills in catalog-derived fields on incomplete watchlist entries
#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<dyn CatalogProvider>,
    fetch_timeout: Duration,
}

enum Pending {
    Complete(WatchlistEntry),
    Fetching {
        original: WatchlistEntry,
        task: JoinHandle<AppResult<WatchlistEntry>>,
    },
}

impl Enricher {
    pub fn new(catalog: Arc<dyn CatalogProvider>, fetch_timeout: Duration) -> Self {
        Self {
            catalog,
            fetch_timeout,
        }
    }

    /// Enriches every incomplete entry from the catalog.
    ///
    /// Lookups run concurrently, one per incomplete entry, and the call
    /// returns once all of them have settled. Complete entries are never
    /// looked up. A failed or timed-out lookup leaves its entry exactly as it
    /// was. The result has the same version, length and order as the input.
    pub async fn enrich(&self, snapshot: WatchlistSnapshot) -> WatchlistSnapshot {
        let WatchlistSnapshot { version, entries } = snapshot;

        let pending: Vec<Pending> = entries
            .into_iter()
            .map(|entry| {
                if entry.is_complete() {
                    return Pending::Complete(entry);
                }

                let catalog = Arc::clone(&self.catalog);
                let fetch_timeout = self.fetch_timeout;
                let original = entry.clone();
                let task = tokio::spawn(async move {
                    let details = fetch_details(catalog.as_ref(), entry.movie_id, fetch_timeout).await?;
                    Ok::<_, AppError>(entry.enriched_with(&details))
                });

                Pending::Fetching { original, task }
            })
            .collect();

        let mut fetched = 0;
        let mut failed = 0;
        let mut enriched = Vec::with_capacity(pending.len());

        for item in pending {
            match item {
                Pending::Complete(entry) => enriched.push(entry),
                Pending::Fetching { original, task } => {
                    fetched += 1;
                    match task.await {
                        Ok(Ok(entry)) => enriched.push(entry),
                        Ok(Err(e)) => {
                            failed += 1;
                            tracing::warn!(
                                movie_id = %original.movie_id,
                                error = %e,
                                "Keeping watchlist entry unenriched"
                            );
                            enriched.push(original);
                        }
                        Err(e) => {
                            failed += 1;
                            tracing::error!(
                                movie_id = %original.movie_id,
                                error = %e,
                                "Enrichment task join error"
                            );
                            enriched.push(original);
                        }
                    }
                }
            }
        }

        if fetched > 0 {
            tracing::info!(
                version,
                fetched,
                failed,
                provider = self.catalog.name(),
                "Watchlist enrichment pass finished"
            );
        }

        WatchlistSnapshot::new(version, enriched)
    }
}

/// One bounded catalog lookup; every failure becomes `EntryFetchFailed`
async fn fetch_details(
    catalog: &dyn CatalogProvider,
    movie_id: MovieId,
    fetch_timeout: Duration,
) -> AppResult<MovieDetails> {
    let failed = |reason: String| AppError::EntryFetchFailed { movie_id, reason };

    let details = match tokio::time::timeout(fetch_timeout, catalog.fetch_movie(movie_id)).await {
        Ok(Ok(details)) => details,
        Ok(Err(e)) => return Err(failed(e.to_string())),
        Err(_) => return Err(failed(format!("timed out after {:?}", fetch_timeout))),
    };

    if details.id != movie_id {
        return Err(failed(format!("catalog answered with movie {}", details.id)));
    }

    Ok(details)
}
