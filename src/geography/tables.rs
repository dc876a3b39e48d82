//! Versioned reference tables
//!
//! Defaults are compiled in. An override file (TOML, JSON or YAML) can be
//! layered on top with [`GeoTables::load`]; maps merge per key, lists are
//! replaced wholesale.

use anyhow::{Context, Result};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{CountryBoundary, NeighborTable};
use crate::models::{normalize_country_code, CountryCode};

pub const BUILTIN_TABLES_VERSION: &str = "builtin-2024.2";

/// Coordinate that real devices should never report (emulator defaults,
/// null island, well-known test campuses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeCoordinate {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTables {
    pub version: String,
    pub boundaries: BTreeMap<CountryCode, CountryBoundary>,
    pub neighbors: NeighborTable,
    pub supported_countries: BTreeSet<CountryCode>,
    /// Ranges reused as a stand-in VPN signal
    pub vpn_ranges: Vec<IpNet>,
    /// Hosting / cloud provider prefixes
    pub datacenter_prefixes: Vec<IpNet>,
    pub known_fake_coordinates: Vec<FakeCoordinate>,
}

impl GeoTables {
    /// Load tables from `path`, layered over the built-in defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let defaults = config::Config::try_from(&Self::default())
            .context("failed to serialize built-in geo tables")?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read geo tables from {}", path.display()))?;

        let tables: GeoTables = settings
            .try_deserialize()
            .with_context(|| format!("invalid geo tables in {}", path.display()))?;

        tracing::info!(
            "Loaded geo tables version {} from {}",
            tables.version,
            path.display()
        );

        Ok(tables.normalize())
    }

    pub fn boundary(&self, country: &str) -> Option<&CountryBoundary> {
        self.boundaries.get(country)
    }

    /// `None` means no boundary data exists for the country
    pub fn within_bounds(&self, latitude: f64, longitude: f64, country: &str) -> Option<bool> {
        self.boundary(country)
            .map(|boundary| boundary.contains(latitude, longitude))
    }

    pub fn are_neighbors(&self, a: &str, b: &str) -> bool {
        self.neighbors.are_neighbors(a, b)
    }

    pub fn is_supported(&self, country: &str) -> bool {
        self.supported_countries
            .contains(&normalize_country_code(country))
    }

    /// Upper-case every country code so lookups are case-insensitive
    /// regardless of how an override file spelled them
    fn normalize(self) -> Self {
        Self {
            boundaries: self
                .boundaries
                .into_iter()
                .map(|(code, boundary)| (normalize_country_code(&code), boundary))
                .collect(),
            neighbors: self.neighbors.normalize(),
            supported_countries: self
                .supported_countries
                .iter()
                .map(|code| normalize_country_code(code))
                .collect(),
            ..self
        }
    }
}

impl Default for GeoTables {
    fn default() -> Self {
        Self {
            version: BUILTIN_TABLES_VERSION.to_string(),
            boundaries: default_boundaries(),
            neighbors: default_neighbors(),
            supported_countries: SUPPORTED_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            vpn_ranges: parse_nets(VPN_RANGES),
            datacenter_prefixes: parse_nets(DATACENTER_PREFIXES),
            known_fake_coordinates: default_fake_coordinates(),
        }
    }
}

const SUPPORTED_COUNTRIES: &[&str] = &[
    "BJ", "BW", "CI", "CM", "EG", "ET", "GH", "KE", "MA", "MW", "MZ", "NA", "NG", "RW", "SN",
    "TG", "TZ", "UG", "ZA", "ZM", "ZW",
];

const VPN_RANGES: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "fc00::/7",
    "fe80::/10",
    "::1/128",
];

const DATACENTER_PREFIXES: &[&str] = &[
    // AWS
    "3.0.0.0/9",
    "52.0.0.0/11",
    "54.64.0.0/11",
    // Google Cloud
    "34.64.0.0/10",
    "35.184.0.0/13",
    // Azure
    "13.64.0.0/11",
    "20.32.0.0/11",
    // DigitalOcean
    "138.197.0.0/16",
    "159.65.0.0/16",
    "167.99.0.0/16",
    // Linode
    "45.79.0.0/16",
    "172.104.0.0/15",
    // Vultr
    "45.32.0.0/16",
    "45.63.0.0/17",
    // OVH
    "51.38.0.0/16",
    "145.239.0.0/16",
    // Hetzner
    "88.198.0.0/16",
    "116.202.0.0/16",
];

fn parse_nets(entries: &[&str]) -> Vec<IpNet> {
    entries.iter().filter_map(|s| s.parse().ok()).collect()
}

fn default_boundaries() -> BTreeMap<CountryCode, CountryBoundary> {
    [
        ("BJ", CountryBoundary::new(6.2, 12.4, 0.8, 3.9)),
        ("BW", CountryBoundary::new(-26.9, -17.8, 19.9, 29.4)),
        ("CI", CountryBoundary::new(4.3, 10.7, -8.6, -2.5)),
        ("CM", CountryBoundary::new(1.6, 13.1, 8.5, 16.2)),
        ("EG", CountryBoundary::new(22.0, 31.7, 24.7, 36.9)),
        ("ET", CountryBoundary::new(3.4, 14.9, 33.0, 48.0)),
        ("GB", CountryBoundary::new(49.9, 60.9, -8.2, 1.8)),
        ("GH", CountryBoundary::new(4.7, 11.2, -3.3, 1.2)),
        ("KE", CountryBoundary::new(-4.7, 5.0, 33.9, 41.9)),
        ("MA", CountryBoundary::new(27.6, 35.9, -13.2, -1.0)),
        ("MW", CountryBoundary::new(-17.1, -9.4, 32.7, 35.9)),
        ("MZ", CountryBoundary::new(-26.9, -10.4, 30.2, 40.9)),
        ("NA", CountryBoundary::new(-29.0, -16.9, 11.7, 25.3)),
        ("NG", CountryBoundary::new(4.2, 13.9, 2.7, 14.7)),
        ("RW", CountryBoundary::new(-2.9, -1.0, 28.8, 30.9)),
        ("SN", CountryBoundary::new(12.3, 16.7, -17.6, -11.3)),
        ("TG", CountryBoundary::new(6.1, 11.2, -0.2, 1.9)),
        ("TZ", CountryBoundary::new(-11.8, -0.9, 29.3, 40.5)),
        ("UG", CountryBoundary::new(-1.5, 4.3, 29.5, 35.1)),
        ("US", CountryBoundary::new(24.5, 49.4, -124.8, -66.9)),
        ("ZA", CountryBoundary::new(-34.9, -22.1, 16.4, 32.9)),
        ("ZM", CountryBoundary::new(-18.1, -8.2, 21.9, 33.7)),
        ("ZW", CountryBoundary::new(-22.5, -15.6, 25.2, 33.1)),
    ]
    .into_iter()
    .map(|(code, boundary)| (code.to_string(), boundary))
    .collect()
}

fn default_neighbors() -> NeighborTable {
    [
        ("BJ", &["NG", "TG", "NE", "BF"][..]),
        ("BW", &["ZA", "NA", "ZW", "ZM"][..]),
        ("CI", &["GH", "LR", "GN", "ML", "BF"][..]),
        ("CM", &["NG", "TD", "CF", "CG", "GA", "GQ"][..]),
        ("EG", &["LY", "SD", "IL", "PS"][..]),
        ("ET", &["KE", "SO", "DJ", "ER", "SD", "SS"][..]),
        ("GH", &["CI", "BF", "TG"][..]),
        ("KE", &["TZ", "UG", "ET", "SO", "SS"][..]),
        ("MA", &["DZ", "EH", "ES"][..]),
        ("MW", &["TZ", "MZ", "ZM"][..]),
        ("MZ", &["ZA", "SZ", "ZW", "ZM", "MW", "TZ"][..]),
        ("NA", &["ZA", "BW", "AO", "ZM"][..]),
        ("NG", &["BJ", "NE", "TD", "CM"][..]),
        ("RW", &["UG", "TZ", "BI", "CD"][..]),
        ("SN", &["GM", "MR", "ML", "GN", "GW"][..]),
        ("TG", &["GH", "BJ", "BF"][..]),
        ("TZ", &["KE", "UG", "RW", "BI", "CD", "ZM", "MW", "MZ"][..]),
        ("UG", &["KE", "TZ", "RW", "CD", "SS"][..]),
        ("ZA", &["NA", "BW", "ZW", "MZ", "SZ", "LS"][..]),
        ("ZM", &["TZ", "CD", "AO", "NA", "BW", "ZW", "MZ", "MW"][..]),
        ("ZW", &["ZA", "BW", "ZM", "MZ"][..]),
    ]
    .into_iter()
    .collect()
}

fn default_fake_coordinates() -> Vec<FakeCoordinate> {
    [
        ("null island", 0.0, 0.0),
        ("android emulator default", 37.4220, -122.0841),
        ("ios simulator default", 37.785834, -122.406417),
        ("apple park", 37.3349, -122.0090),
    ]
    .into_iter()
    .map(|(label, latitude, longitude)| FakeCoordinate {
        label: label.to_string(),
        latitude,
        longitude,
    })
    .collect()
}
