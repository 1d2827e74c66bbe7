use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    error::AppResult,
    models::{Session, WatchlistSnapshot, WatchlistView},
    services::{
        aggregator::aggregate,
        enrichment::Enricher,
        watchlist_store::{Subscription, WatchlistStore},
    },
};

/// Live, enriched view of one user's watchlist
///
/// Every store revision is published right away with its stats, then again
/// once its enrichment pass settles. An enrichment result is applied only
/// while the published view is still at the version the pass started from,
/// so a slow pass can never overwrite a newer revision (for example bring a
/// removed movie back).
pub struct WatchlistSync {
    view: watch::Receiver<WatchlistView>,
    _subscription: Subscription,
}

impl WatchlistSync {
    pub async fn start(
        store: &WatchlistStore,
        enricher: Enricher,
        session: &Session,
    ) -> AppResult<Self> {
        let (view_tx, view) = watch::channel(WatchlistView::default());
        let view_tx = Arc::new(view_tx);

        let subscription = store
            .subscribe(session, move |snapshot| {
                publish(&view_tx, &enricher, snapshot);
            })
            .await?;

        Ok(Self {
            view,
            _subscription: subscription,
        })
    }

    /// Receiver that yields the current view and every later one
    pub fn view(&self) -> watch::Receiver<WatchlistView> {
        self.view.clone()
    }

    pub fn current(&self) -> WatchlistView {
        self.view.borrow().clone()
    }

    /// Stops following the store
    pub fn stop(self) {
        drop(self);
    }
}

fn publish(view_tx: &Arc<watch::Sender<WatchlistView>>, enricher: &Enricher, snapshot: WatchlistSnapshot) {
    let version = snapshot.version;
    let settled = snapshot.entries.iter().all(|e| e.is_complete());

    view_tx.send_replace(WatchlistView {
        version,
        enriched: settled,
        stats: aggregate(&snapshot),
        entries: snapshot.entries.clone(),
    });

    if settled {
        return;
    }

    let view_tx = Arc::clone(view_tx);
    let enricher = enricher.clone();
    tokio::spawn(async move {
        let enriched = enricher.enrich(snapshot).await;

        let applied = view_tx.send_if_modified(|view| {
            if view.version != version {
                return false;
            }
            *view = WatchlistView {
                version,
                enriched: true,
                stats: aggregate(&enriched),
                entries: enriched.entries.clone(),
            };
            true
        });

        if !applied {
            tracing::debug!(version, "Discarding enrichment of superseded watchlist revision");
        }
    });
}
