//! VPN / proxy heuristics
//!
//! Best-effort only: a hit adds risk weight but never fails a verification
//! on its own. The trait is the stable seam; a reputation- or ASN-backed
//! detector can replace [`HeuristicVpnDetector`] without touching scoring.

use ipnet::IpNet;
use std::net::IpAddr;

use crate::geography::GeoTables;

pub trait VpnDetector: Send + Sync {
    /// Likely anonymized traffic (VPN egress, proxy, hosting provider)
    fn is_vpn_or_proxy(&self, ip: IpAddr) -> bool;

    /// Address falls in a known datacenter prefix
    fn is_suspicious_pattern(&self, ip: IpAddr) -> bool;
}

/// Prefix-list detector built from the configured tables
#[derive(Debug, Clone, Default)]
pub struct HeuristicVpnDetector {
    vpn_ranges: Vec<IpNet>,
    datacenter_prefixes: Vec<IpNet>,
}

impl HeuristicVpnDetector {
    pub fn new(vpn_ranges: Vec<IpNet>, datacenter_prefixes: Vec<IpNet>) -> Self {
        Self {
            vpn_ranges,
            datacenter_prefixes,
        }
    }

    pub fn from_tables(tables: &GeoTables) -> Self {
        Self::new(tables.vpn_ranges.clone(), tables.datacenter_prefixes.clone())
    }
}

fn matches_any(ranges: &[IpNet], ip: IpAddr) -> bool {
    let ip = ip.to_canonical();
    ranges.iter().any(|net| net.contains(&ip))
}

impl VpnDetector for HeuristicVpnDetector {
    fn is_vpn_or_proxy(&self, ip: IpAddr) -> bool {
        matches_any(&self.vpn_ranges, ip) || matches_any(&self.datacenter_prefixes, ip)
    }

    fn is_suspicious_pattern(&self, ip: IpAddr) -> bool {
        matches_any(&self.datacenter_prefixes, ip)
    }
}
