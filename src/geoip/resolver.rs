//! Sequential provider fallback
//!
//! Providers are tried strictly in priority order, each exactly once. Every
//! attempt runs under a per-provider timeout, and the whole chain shares one
//! deadline plus a cancellation token, so a slow provider cannot stall a call
//! for longer than the configured budget.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::provider::{GeoProvider, ProviderError};
use crate::models::{normalize_country_code, GeolocationResult};
use crate::network::{anonymize_ip, is_private_ip};

pub const PRIVATE_ADDRESS_ERROR: &str = "private/local address";
pub const INVALID_ADDRESS_ERROR: &str = "invalid IP address";
pub const LOOKUP_EXHAUSTED_ERROR: &str = "Unable to determine your country from your IP address. \
     Please verify your location using your phone number instead.";

/// Normalized IP-to-country lookup
#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// `None` locates the caller's own egress address
    async fn get_country_from_ip(&self, ip: Option<&str>) -> GeolocationResult;
}

pub struct FallbackResolver {
    providers: Vec<Arc<dyn GeoProvider>>,
    per_provider_timeout: Duration,
    overall_deadline: Duration,
    shutdown: CancellationToken,
}

impl FallbackResolver {
    pub fn new(
        providers: Vec<Arc<dyn GeoProvider>>,
        per_provider_timeout: Duration,
        overall_deadline: Duration,
    ) -> Self {
        Self {
            providers,
            per_provider_timeout,
            overall_deadline,
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie every lookup to a process-wide shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve `ip`, giving up early if `cancel` fires
    pub async fn resolve(&self, ip: Option<&str>, cancel: &CancellationToken) -> GeolocationResult {
        let addr = match ip.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    debug!("Rejecting unparsable address before lookup");
                    return GeolocationResult::failure(INVALID_ADDRESS_ERROR, Some(raw.to_string()));
                }
            },
        };

        if let Some(addr) = addr {
            if is_private_ip(addr) {
                debug!("Skipping lookup for private address {}", anonymize_ip(addr));
                return GeolocationResult::failure(PRIVATE_ADDRESS_ERROR, Some(addr.to_string()));
            }
        }

        let deadline = Instant::now() + self.overall_deadline;

        for provider in &self.providers {
            if cancel.is_cancelled() {
                warn!("Geolocation cancelled before trying {}", provider.name());
                break;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    "Geolocation deadline of {:?} exhausted before trying {}",
                    self.overall_deadline,
                    provider.name()
                );
                break;
            }
            let budget = remaining.min(self.per_provider_timeout);

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = tokio::time::timeout(budget, provider.lookup(addr)) => Some(
                    result.unwrap_or(Err(ProviderError::Timeout(budget)))
                ),
            };

            let Some(attempt) = attempt else {
                warn!("Geolocation cancelled while waiting on {}", provider.name());
                break;
            };

            match attempt {
                Ok(hit) => {
                    let country_code = normalize_country_code(&hit.country_code);
                    debug!("{} resolved address to {}", provider.name(), country_code);
                    let ip = hit.ip.or_else(|| addr.map(|a| a.to_string()));
                    return GeolocationResult::found(country_code, hit.country_name, ip);
                }
                Err(e) => {
                    warn!("Geolocation provider {} failed: {}", provider.name(), e);
                }
            }
        }

        GeolocationResult::failure(LOOKUP_EXHAUSTED_ERROR, addr.map(|a| a.to_string()))
    }
}

#[async_trait]
impl GeoResolver for FallbackResolver {
    async fn get_country_from_ip(&self, ip: Option<&str>) -> GeolocationResult {
        let cancel = self.shutdown.child_token();
        self.resolve(ip, &cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoip::ProviderHit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        name: &'static str,
        outcome: Option<&'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn ok(name: &'static str, country: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Some(country),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(name: &'static str, country: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Some(country),
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, _ip: Option<IpAddr>) -> Result<ProviderHit, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.outcome {
                Some(code) => Ok(ProviderHit {
                    country_code: code.to_string(),
                    country_name: None,
                    ip: None,
                }),
                None => Err(ProviderError::Rejected("quota exceeded".to_string())),
            }
        }
    }

    fn resolver(providers: Vec<Arc<dyn GeoProvider>>) -> FallbackResolver {
        FallbackResolver::new(providers, Duration::from_millis(200), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let primary = FixedProvider::ok("primary", "ke");
        let secondary = FixedProvider::ok("secondary", "NG");
        let resolver = resolver(vec![primary.clone(), secondary.clone()]);

        let result = resolver.get_country_from_ip(Some("41.90.64.1")).await;

        assert!(result.success);
        assert_eq!(result.country_code.as_deref(), Some("KE"));
        assert_eq!(result.ip.as_deref(), Some("41.90.64.1"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_after_failure() {
        let primary = FixedProvider::failing("primary");
        let secondary = FixedProvider::ok("secondary", "NG");
        let resolver = resolver(vec![primary.clone(), secondary.clone()]);

        let result = resolver.get_country_from_ip(Some("102.89.1.1")).await;

        assert_eq!(result.country_code.as_deref(), Some("NG"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_failures_report_exhaustion() {
        let primary = FixedProvider::failing("primary");
        let secondary = FixedProvider::failing("secondary");
        let resolver = resolver(vec![primary.clone(), secondary.clone()]);

        let result = resolver.get_country_from_ip(Some("102.89.1.1")).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(LOOKUP_EXHAUSTED_ERROR));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_private_address_skips_providers() {
        let primary = FixedProvider::ok("primary", "KE");
        let resolver = resolver(vec![primary.clone()]);

        for ip in ["127.0.0.1", "10.0.0.8", "192.168.1.1", "::1", "fd00::1"] {
            let result = resolver.get_country_from_ip(Some(ip)).await;
            assert!(!result.success);
            assert_eq!(result.error.as_deref(), Some(PRIVATE_ADDRESS_ERROR));
        }
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_address_skips_providers() {
        let primary = FixedProvider::ok("primary", "KE");
        let resolver = resolver(vec![primary.clone()]);

        let result = resolver.get_country_from_ip(Some("not-an-ip")).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(INVALID_ADDRESS_ERROR));
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_ip_asks_for_self_lookup() {
        let primary = FixedProvider::ok("primary", "ZA");
        let resolver = resolver(vec![primary.clone()]);

        let result = resolver.get_country_from_ip(None).await;

        assert_eq!(result.country_code.as_deref(), Some("ZA"));
        assert_eq!(result.ip, None);
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_and_next_is_tried() {
        let slow = FixedProvider::slow("slow", "US", Duration::from_secs(5));
        let fast = FixedProvider::ok("fast", "KE");
        let resolver = FallbackResolver::new(
            vec![slow.clone(), fast.clone()],
            Duration::from_millis(50),
            Duration::from_secs(2),
        );

        let result = resolver.get_country_from_ip(Some("41.90.64.1")).await;

        assert_eq!(result.country_code.as_deref(), Some("KE"));
        assert_eq!(slow.calls(), 1);
        assert_eq!(fast.calls(), 1);
    }

    #[tokio::test]
    async fn test_overall_deadline_stops_chain() {
        let slow = FixedProvider::slow("slow", "US", Duration::from_secs(5));
        let never = FixedProvider::ok("never", "KE");
        let resolver = FallbackResolver::new(
            vec![slow.clone(), never.clone()],
            Duration::from_secs(1),
            Duration::from_millis(50),
        );

        let result = resolver.get_country_from_ip(Some("41.90.64.1")).await;

        assert!(!result.success);
        assert_eq!(never.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_lookup() {
        let primary = FixedProvider::ok("primary", "KE");
        let shutdown = CancellationToken::new();
        let resolver = resolver(vec![primary.clone()]).with_shutdown(shutdown.clone());

        shutdown.cancel();
        let result = resolver.get_country_from_ip(Some("41.90.64.1")).await;

        assert!(!result.success);
        assert_eq!(primary.calls(), 0);
    }
}
