use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Config, FailurePolicy, ProviderKind};
use crate::geography::GeoTables;
use crate::geoip::{
    build_http_client, CachedResolver, FallbackResolver, GeoProvider, GeoResolver,
    IpApiComProvider, IpapiCoProvider, MmdbProvider,
};
use crate::models::{
    normalize_country_code, BrowserGeolocation, GeolocationResult, LocationVerificationResult,
    VerificationMethod,
};
use crate::network::{HeuristicVpnDetector, VpnDetector};

use super::browser::assess_browser;
use super::hybrid::combine_results;

/// Entry point for every location check
///
/// Stateless between calls: the resolver, detector and tables are shared
/// read-only, so one verifier can serve concurrent requests.
pub struct LocationVerifier {
    pub(crate) resolver: Arc<dyn GeoResolver>,
    pub(crate) vpn: Arc<dyn VpnDetector>,
    pub(crate) tables: Arc<GeoTables>,
    pub(crate) failure_policy: FailurePolicy,
}

impl LocationVerifier {
    pub fn new(resolver: Arc<dyn GeoResolver>, tables: Arc<GeoTables>) -> Self {
        let vpn = Arc::new(HeuristicVpnDetector::from_tables(&tables));

        Self {
            resolver,
            vpn,
            tables,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_vpn_detector(mut self, vpn: Arc<dyn VpnDetector>) -> Self {
        self.vpn = vpn;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Build the full provider chain, cache and tables from configuration
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Result<Self> {
        let tables = match config.verification.tables_path.as_deref() {
            Some(path) => GeoTables::load(path)?,
            None => GeoTables::default(),
        };
        info!("Using geo tables version {}", tables.version);

        let per_provider_timeout = Duration::from_millis(config.resolver.per_provider_timeout_ms);
        let client = build_http_client(per_provider_timeout)?;

        let mut providers: Vec<Arc<dyn GeoProvider>> = Vec::new();
        for kind in &config.resolver.providers {
            match kind {
                ProviderKind::Mmdb => {
                    let path = config
                        .resolver
                        .mmdb_path
                        .as_deref()
                        .context("GEOIP_MMDB_PATH must be set to use the mmdb provider")?;
                    providers.push(Arc::new(MmdbProvider::open(path)?));
                }
                ProviderKind::Ipapi => providers.push(Arc::new(IpapiCoProvider::new(client.clone()))),
                ProviderKind::IpApiCom => {
                    providers.push(Arc::new(IpApiComProvider::new(client.clone())))
                }
            }
        }

        let fallback = FallbackResolver::new(
            providers,
            per_provider_timeout,
            Duration::from_millis(config.resolver.overall_deadline_ms),
        )
        .with_shutdown(shutdown);
        info!("Geolocation providers: {}", fallback.provider_names().join(" -> "));

        let resolver: Arc<dyn GeoResolver> = if config.cache.enabled {
            info!(
                "Geolocation cache enabled ({} entries, {}s TTL)",
                config.cache.max_entries, config.cache.ttl_secs
            );
            Arc::new(CachedResolver::new(
                Arc::new(fallback),
                config.cache.max_entries,
                Duration::from_secs(config.cache.ttl_secs),
            ))
        } else {
            Arc::new(fallback)
        };

        Ok(Self::new(resolver, Arc::new(tables))
            .with_failure_policy(config.verification.failure_policy))
    }

    pub fn tables(&self) -> &GeoTables {
        &self.tables
    }

    pub async fn get_country_from_ip(&self, ip: Option<&str>) -> GeolocationResult {
        self.resolver.get_country_from_ip(ip).await
    }

    pub async fn verify_ip_location(
        &self,
        ip: Option<&str>,
        registered_country: &str,
    ) -> LocationVerificationResult {
        let registered = normalize_country_code(registered_country);

        let result = self
            .assess_ip(ip, &registered)
            .await
            .unwrap_or_else(|e| {
                LocationVerificationResult::error(
                    registered.clone(),
                    VerificationMethod::Ip,
                    ip.map(|s| s.trim().to_string()),
                    e,
                )
            });

        log_outcome(&result);
        result
    }

    pub fn verify_browser_location(
        &self,
        location: &BrowserGeolocation,
        registered_country: &str,
    ) -> LocationVerificationResult {
        let registered = normalize_country_code(registered_country);

        let result = assess_browser(location, &registered, &self.tables).unwrap_or_else(|e| {
            LocationVerificationResult::error(registered.clone(), VerificationMethod::Browser, None, e)
        });

        log_outcome(&result);
        result
    }

    /// IP check always; browser check and combination when a coordinate is given
    pub async fn verify_hybrid_location(
        &self,
        ip: Option<&str>,
        location: Option<&BrowserGeolocation>,
        registered_country: &str,
    ) -> LocationVerificationResult {
        let ip_result = self.verify_ip_location(ip, registered_country).await;

        let Some(location) = location else {
            return ip_result;
        };

        let browser_result = self.verify_browser_location(location, registered_country);
        let result = combine_results(ip_result, browser_result);

        log_outcome(&result);
        result
    }

    pub fn is_detected_country_supported(&self, country_code: &str) -> bool {
        self.tables.is_supported(country_code)
    }
}

fn log_outcome(result: &LocationVerificationResult) {
    debug!(
        "{:?} verification for {}: verified={} risk={} flags=[{}]",
        result.verification_method,
        result.registered_country,
        result.verified,
        result.risk_score,
        result
            .flags
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );
}
