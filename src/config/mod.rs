use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub cache: CacheConfig,
    pub verification: VerificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local MaxMind database
    Mmdb,
    /// ipapi.co
    Ipapi,
    /// ip-api.com
    IpApiCom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Strategies in priority order
    pub providers: Vec<ProviderKind>,
    pub per_provider_timeout_ms: u64,
    pub overall_deadline_ms: u64,
    #[serde(default)]
    pub mmdb_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: u64,
    pub ttl_secs: u64,
}

/// What happens to risk gathered before a failed IP lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Discard earlier risk and flags; report a fixed lookup-failure score
    #[default]
    Reset,
    /// Keep earlier risk and flags and add the lookup-failure score on top
    Accumulate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub failure_policy: FailurePolicy,
    /// Optional override file for the geo tables
    #[serde(default)]
    pub tables_path: Option<String>,
}

impl ResolverConfig {
    const fn default_timeout_ms() -> u64 {
        3000
    }

    const fn default_deadline_ms() -> u64 {
        8000
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderKind::Ipapi, ProviderKind::IpApiCom],
            per_provider_timeout_ms: Self::default_timeout_ms(),
            overall_deadline_ms: Self::default_deadline_ms(),
            mmdb_path: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            ttl_secs: 300,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Parse a comma-separated provider list, skipping unknown names
pub fn parse_providers(list: &str) -> Vec<ProviderKind> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter_map(|name| match name.as_str() {
            "mmdb" | "maxmind" => Some(ProviderKind::Mmdb),
            "ipapi" | "ipapi.co" => Some(ProviderKind::Ipapi),
            "ipapicom" | "ip-api" | "ip-api.com" => Some(ProviderKind::IpApiCom),
            other => {
                tracing::warn!(
                    "Unknown geolocation provider '{other}', ignoring. Supported values: mmdb, ipapi, ipapicom"
                );
                None
            }
        })
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("GEOVERIFY_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("GEOVERIFY_PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse::<u16>()
            .context("GEOVERIFY_PORT must be a valid port number")?;

        let mut providers = std::env::var("GEOIP_PROVIDERS")
            .map(|v| parse_providers(&v))
            .unwrap_or_else(|_| ResolverConfig::default().providers);

        let mmdb_path = std::env::var("GEOIP_MMDB_PATH").ok();

        if providers.contains(&ProviderKind::Mmdb) && mmdb_path.is_none() {
            tracing::warn!("GEOIP_PROVIDERS lists 'mmdb' but GEOIP_MMDB_PATH is not set, skipping it");
            providers.retain(|p| *p != ProviderKind::Mmdb);
        }

        if providers.is_empty() {
            anyhow::bail!("GEOIP_PROVIDERS must name at least one usable provider");
        }

        let resolver = ResolverConfig {
            providers,
            per_provider_timeout_ms: env_u64(
                "GEOIP_PROVIDER_TIMEOUT_MS",
                ResolverConfig::default_timeout_ms(),
            ),
            overall_deadline_ms: env_u64("GEOIP_DEADLINE_MS", ResolverConfig::default_deadline_ms()),
            mmdb_path,
        };

        let cache_defaults = CacheConfig::default();
        let cache = CacheConfig {
            enabled: env_flag("GEOIP_CACHE_ENABLED", cache_defaults.enabled),
            max_entries: env_u64("GEOIP_CACHE_MAX_ENTRIES", cache_defaults.max_entries),
            ttl_secs: env_u64("GEOIP_CACHE_TTL_SECS", cache_defaults.ttl_secs),
        };

        let failure_policy = match std::env::var("GEOVERIFY_FAILURE_POLICY")
            .unwrap_or_else(|_| "reset".to_string())
            .to_lowercase()
            .as_str()
        {
            "reset" => FailurePolicy::Reset,
            "accumulate" => FailurePolicy::Accumulate,
            other => {
                tracing::warn!(
                    "Unknown GEOVERIFY_FAILURE_POLICY '{other}', falling back to 'reset'. Supported values: reset, accumulate"
                );
                FailurePolicy::Reset
            }
        };

        Ok(Config {
            server: ServerConfig { host, port },
            resolver,
            cache,
            verification: VerificationConfig {
                failure_policy,
                tables_path: std::env::var("GEOVERIFY_TABLES_PATH").ok(),
            },
        })
    }
}
