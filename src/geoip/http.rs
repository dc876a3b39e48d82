//! HTTP geolocation providers
//!
//! Each provider maps its own JSON shape into a [`ProviderHit`]. Failure is
//! signalled either by a non-2xx status or by a provider-specific field in
//! an otherwise successful response.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use super::provider::{GeoProvider, ProviderError, ProviderHit};

pub const IPAPI_CO_BASE_URL: &str = "https://ipapi.co";
pub const IP_API_COM_BASE_URL: &str = "http://ip-api.com";

/// Shared client for all HTTP providers
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent("geoverify/0.1.0")
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client for geolocation providers")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// ipapi.co: `GET {base}/{ip}/json/`
#[derive(Clone)]
pub struct IpapiCoProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpapiCoResponse {
    ip: Option<String>,
    country_code: Option<String>,
    country_name: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpapiCoProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, IPAPI_CO_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, ip: Option<IpAddr>) -> String {
        match ip {
            Some(ip) => format!("{}/{}/json/", self.base_url, ip),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[async_trait]
impl GeoProvider for IpapiCoProvider {
    fn name(&self) -> &str {
        "ipapi.co"
    }

    async fn lookup(&self, ip: Option<IpAddr>) -> Result<ProviderHit, ProviderError> {
        let response = self.client.get(self.url_for(ip)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: IpapiCoResponse = response.json().await?;

        if body.error {
            return Err(ProviderError::Rejected(
                body.reason.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let country_code = non_empty(body.country_code).ok_or(ProviderError::MissingCountry)?;

        Ok(ProviderHit {
            country_code,
            country_name: non_empty(body.country_name),
            ip: body.ip,
        })
    }
}

/// ip-api.com: `GET {base}/json/{ip}`
#[derive(Clone)]
pub struct IpApiComProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiComResponse {
    status: String,
    message: Option<String>,
    country_code: Option<String>,
    country: Option<String>,
    query: Option<String>,
}

impl IpApiComProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, IP_API_COM_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, ip: Option<IpAddr>) -> String {
        match ip {
            Some(ip) => format!("{}/json/{}", self.base_url, ip),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiComProvider {
    fn name(&self) -> &str {
        "ip-api.com"
    }

    async fn lookup(&self, ip: Option<IpAddr>) -> Result<ProviderHit, ProviderError> {
        let response = self.client.get(self.url_for(ip)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: IpApiComResponse = response.json().await?;

        if body.status != "success" {
            return Err(ProviderError::Rejected(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        let country_code = non_empty(body.country_code).ok_or(ProviderError::MissingCountry)?;

        Ok(ProviderHit {
            country_code,
            country_name: non_empty(body.country),
            ip: body.query,
        })
    }
}
