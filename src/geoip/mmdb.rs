//! Offline lookup against a MaxMind GeoLite2/GeoIP2 database

use anyhow::{Context, Result};
use async_trait::async_trait;
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;

use super::provider::{GeoProvider, ProviderError, ProviderHit};

/// Memory-mapped MMDB strategy
///
/// City and Country databases both work: Country data is a subset of City.
#[derive(Clone)]
pub struct MmdbProvider {
    reader: Arc<Reader<Mmap>>,
}

impl MmdbProvider {
    pub fn open(path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP database at {}", path))?;

        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup_country(&self, ip: IpAddr) -> Option<ProviderHit> {
        let result = self.reader.lookup(ip).ok()?;
        let country = result.decode::<geoip2::Country>().ok()??;

        let country_code = country.country.iso_code?.to_string();
        let country_name = country.country.names.english.map(|s| s.to_string());

        Some(ProviderHit {
            country_code,
            country_name,
            ip: Some(ip.to_string()),
        })
    }
}

#[async_trait]
impl GeoProvider for MmdbProvider {
    fn name(&self) -> &str {
        "mmdb"
    }

    async fn lookup(&self, ip: Option<IpAddr>) -> Result<ProviderHit, ProviderError> {
        // A local database cannot discover the caller's own egress address
        let ip = ip.ok_or(ProviderError::AddressRequired)?;

        self.lookup_country(ip)
            .ok_or(ProviderError::MissingCountry)
    }
}
