/// Read-through caching for catalog calls.
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the result for caching with `$ttl` seconds and returns
/// it. Errors from the cache read or from `$block` are propagated with `?`.
///
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Genres, GENRES_CACHE_TTL, async move {
///     self.get_json::<GenreList>("/genre/movie/list", &[]).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(hit) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(hit)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
