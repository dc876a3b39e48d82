//! Shared stubs for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use geoverify::geography::GeoTables;
use geoverify::geoip::GeoResolver;
use geoverify::{BrowserGeolocation, GeolocationResult, LocationVerifier};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Deterministic resolver backed by a fixed address -> country map
#[derive(Default)]
pub struct StaticResolver {
    answers: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(answers: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            answers: answers
                .iter()
                .map(|(ip, country)| (ip.to_string(), country.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoResolver for StaticResolver {
    async fn get_country_from_ip(&self, ip: Option<&str>) -> GeolocationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match ip.and_then(|ip| self.answers.get(ip)) {
            Some(country) => {
                GeolocationResult::found(country.clone(), None, ip.map(|s| s.to_string()))
            }
            None => GeolocationResult::failure("all providers failed", ip.map(|s| s.to_string())),
        }
    }
}

pub fn verifier(resolver: Arc<StaticResolver>) -> LocationVerifier {
    LocationVerifier::new(resolver, Arc::new(GeoTables::default()))
}

pub fn location(latitude: f64, longitude: f64, accuracy: f64) -> BrowserGeolocation {
    BrowserGeolocation {
        latitude,
        longitude,
        accuracy,
        timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    }
}

/// Johannesburg, an ordinary GPS fix
pub fn johannesburg() -> BrowserGeolocation {
    location(-26.2041, 28.0473, 30.0)
}
