pub mod aggregator;
pub mod browse;
pub mod enrichment;
pub mod layout;
pub mod providers;
pub mod sync;
pub mod watchlist_store;

pub use aggregator::aggregate;
pub use enrichment::Enricher;
pub use sync::WatchlistSync;
pub use watchlist_store::{Subscription, WatchlistStore};
