/// A macro to simplify read-through caching against a `JsonCache`.
///
/// This macro checks if a value is present in the cache.
/// If found, it returns the cached value.
/// If not found, it executes the provided block to compute the value,
/// stores it in the cache, and then returns the computed value.
///
/// # Arguments
/// * `$cache`: The cache instance to use for retrieval and storage. The cache must have
///   `get_from_cache` and `set` methods.
/// * `$key`: The key to use for caching the value.
/// * `$block`: The future to await if the value is not found in cache.
///
/// # Example
/// ```rust,ignore
/// let records = cached!(self.cache, CacheKey::AniListSearch(query.to_string()), async move {
///     fetch_from_remote(query).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            tracing::info!(key = %key, records = cached.len(), "Serving from cache");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set(&key, &value).await?;
            Ok(value)
        }
    }};
}
