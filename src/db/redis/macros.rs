/// Read-through caching over [`crate::db::Cache`].
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// result for a background write and returns it. A failed cache read is logged
/// and treated as a miss, so an unavailable Redis never fails the caller.
///
/// * `$cache`: value with `get_from_cache` and `set_in_background`
/// * `$key`: the [`crate::db::CacheKey`]
/// * `$ttl`: time-to-live in seconds
/// * `$block`: future producing `AppResult<T>` on a miss
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
