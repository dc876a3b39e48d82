use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::resolver::GeoResolver;
use crate::models::GeolocationResult;

/// Caching wrapper around any resolver
///
/// Only successful lookups for explicit addresses are cached; failures and
/// self-lookups (`None`) always go through to the inner resolver.
pub struct CachedResolver {
    inner: Arc<dyn GeoResolver>,
    cache: Cache<String, GeolocationResult>,
}

impl CachedResolver {
    pub fn new(inner: Arc<dyn GeoResolver>, max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    /// Drop a cached answer, e.g. after a provider correction
    pub async fn invalidate(&self, ip: &str) {
        self.cache.invalidate(ip.trim()).await;
    }
}

#[async_trait]
impl GeoResolver for CachedResolver {
    async fn get_country_from_ip(&self, ip: Option<&str>) -> GeolocationResult {
        let Some(key) = ip.map(str::trim).filter(|s| !s.is_empty()) else {
            return self.inner.get_country_from_ip(ip).await;
        };

        if let Some(cached) = self.cache.get(key).await {
            debug!("Geolocation cache hit");
            return cached;
        }

        let result = self.inner.get_country_from_ip(Some(key)).await;

        if result.success {
            self.cache.insert(key.to_string(), result.clone()).await;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeoResolver for CountingResolver {
        async fn get_country_from_ip(&self, ip: Option<&str>) -> GeolocationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match ip {
                Some("198.51.100.1") => GeolocationResult::failure("lookup failed", None),
                Some(ip) => GeolocationResult::found("KE".to_string(), None, Some(ip.to_string())),
                None => GeolocationResult::found("ZA".to_string(), None, None),
            }
        }
    }

    fn cached(inner: Arc<CountingResolver>) -> CachedResolver {
        CachedResolver::new(inner, 100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_repeat_lookup_hits_cache() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = cached(Arc::clone(&inner));

        let first = resolver.get_country_from_ip(Some("41.90.64.1")).await;
        let second = resolver.get_country_from_ip(Some(" 41.90.64.1 ")).await;

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = cached(Arc::clone(&inner));

        resolver.get_country_from_ip(Some("198.51.100.1")).await;
        resolver.get_country_from_ip(Some("198.51.100.1")).await;

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_self_lookup_is_not_cached() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = cached(Arc::clone(&inner));

        resolver.get_country_from_ip(None).await;
        resolver.get_country_from_ip(None).await;

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_lookup() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = cached(Arc::clone(&inner));

        resolver.get_country_from_ip(Some("41.90.64.1")).await;
        resolver.invalidate("41.90.64.1").await;
        resolver.get_country_from_ip(Some("41.90.64.1")).await;

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
