//! Client IP extraction from proxy headers
//!
//! Headers are consulted in a fixed priority order and the first entry of the
//! first present header wins. No trust-chain validation is performed: the
//! result feeds a risk score, not an access decision.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Proxy headers in priority order
pub const CLIENT_IP_HEADERS: [&str; 4] = [
    "x-forwarded-for",
    "x-real-ip",
    "cf-connecting-ip",
    "x-vercel-forwarded-for",
];

/// Extract the client IP address from request headers
///
/// Returns the raw textual value; parsing is left to the verification
/// pipeline so that malformed values surface as a verification error.
pub fn get_ip_from_request(headers: &HeaderMap) -> Option<String> {
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| first_entry(headers, name))
}

fn first_entry(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();

    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Anonymize an IP address by truncating to network prefix
///
/// - IPv4: Truncate to /24 (zero last octet)
/// - IPv6: Truncate to /48 (zero last 80 bits)
///
/// Used wherever addresses end up in logs.
pub fn anonymize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(addr) => {
            let octets = addr.octets();
            IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], 0))
        }
        IpAddr::V6(addr) => {
            let segments = addr.segments();
            IpAddr::V6(Ipv6Addr::new(
                segments[0],
                segments[1],
                segments[2],
                0,
                0,
                0,
                0,
                0,
            ))
        }
    }
}
