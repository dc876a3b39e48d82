use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Why a single provider attempt did not produce a country
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider reported failure: {0}")]
    Rejected(String),
    #[error("response did not include a country code")]
    MissingCountry,
    #[error("provider needs an explicit address")]
    AddressRequired,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Country resolved by one provider, already mapped out of its wire format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHit {
    pub country_code: String,
    pub country_name: Option<String>,
    /// Address the provider says it looked up
    pub ip: Option<String>,
}

/// One IP geolocation strategy
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Resolve the country for `ip`; `None` asks the provider to locate the
    /// address the request itself comes from
    async fn lookup(&self, ip: Option<IpAddr>) -> Result<ProviderHit, ProviderError>;
}
