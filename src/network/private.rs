//! Non-routable address classification
//!
//! Loopback, link-local and private (RFC 1918 / IPv6 unique-local) addresses
//! never reach an external geolocation provider.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Classify a textual address as private/loopback/link-local
///
/// Unparsable input is not private; it is rejected later by the resolver.
pub fn is_private_address(ip: &str) -> bool {
    ip.trim()
        .parse::<IpAddr>()
        .map(is_private_ip)
        .unwrap_or(false)
}

pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => is_private_v4(addr),
        IpAddr::V6(addr) => match addr.to_ipv4_mapped() {
            Some(mapped) => is_private_v4(mapped),
            None => is_private_v6(addr),
        },
    }
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_link_local() || addr.is_private()
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    addr.is_loopback()
        // fe80::/10
        || (first & 0xffc0) == 0xfe80
        // fc00::/7
        || (first & 0xfe00) == 0xfc00
}
