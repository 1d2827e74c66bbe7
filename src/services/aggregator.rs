use crate::models::{AggregateStats, WatchlistEntry, WatchlistSnapshot};

/// Derives watchlist statistics from a snapshot.
///
/// Recomputed from scratch on every snapshot; enrichment can change runtime
/// and genres of entries long after they were added.
pub fn aggregate(snapshot: &WatchlistSnapshot) -> AggregateStats {
    aggregate_entries(&snapshot.entries)
}

pub fn aggregate_entries(entries: &[WatchlistEntry]) -> AggregateStats {
    let mut stats = AggregateStats {
        movie_count: entries.len(),
        ..AggregateStats::default()
    };

    for entry in entries {
        stats.total_runtime_minutes += u64::from(entry.runtime_minutes);

        for genre in entry.genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
            *stats.genre_counts.entry(genre.to_string()).or_insert(0) += 1;
        }
    }

    stats
}
