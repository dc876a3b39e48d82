//! Data models shared by the verification engine and its callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// ISO 3166-1 alpha-2 country code (e.g. "KE", "NG")
pub type CountryCode = String;

/// Upper-case and trim a caller-supplied country code
pub fn normalize_country_code(code: &str) -> CountryCode {
    code.trim().to_ascii_uppercase()
}

/// Which signal(s) produced a verification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    Ip,
    Browser,
    Hybrid,
}

/// Named reason contributing to a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    NoIpAddress,
    VpnDetected,
    GeolocationFailed,
    CountryMismatch,
    NeighboringCountry,
    SuspiciousIpPattern,
    CountryBoundariesUnknown,
    OutsideCountryBounds,
    NearBorder,
    LowAccuracy,
    LocationSpoofingDetected,
    VerificationMismatch,
    VerificationError,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::NoIpAddress => "no_ip_address",
            RiskFlag::VpnDetected => "vpn_detected",
            RiskFlag::GeolocationFailed => "geolocation_failed",
            RiskFlag::CountryMismatch => "country_mismatch",
            RiskFlag::NeighboringCountry => "neighboring_country",
            RiskFlag::SuspiciousIpPattern => "suspicious_ip_pattern",
            RiskFlag::CountryBoundariesUnknown => "country_boundaries_unknown",
            RiskFlag::OutsideCountryBounds => "outside_country_bounds",
            RiskFlag::NearBorder => "near_border",
            RiskFlag::LowAccuracy => "low_accuracy",
            RiskFlag::LocationSpoofingDetected => "location_spoofing_detected",
            RiskFlag::VerificationMismatch => "verification_mismatch",
            RiskFlag::VerificationError => "verification_error",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single verification call
///
/// Always fully formed: failures are expressed through `verified: false`,
/// `flags` and `message` rather than through an error type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationVerificationResult {
    pub verified: bool,
    pub registered_country: CountryCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_country: Option<CountryCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub verification_method: VerificationMethod,
    /// Risk in the closed range 0..=100
    pub risk_score: u8,
    pub flags: BTreeSet<RiskFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LocationVerificationResult {
    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Result for an input that could not be evaluated at all
    pub fn error(
        registered_country: CountryCode,
        method: VerificationMethod,
        ip_address: Option<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self {
            verified: false,
            registered_country,
            detected_country: None,
            ip_address,
            verification_method: method,
            risk_score: 70,
            flags: BTreeSet::from([RiskFlag::VerificationError]),
            message: Some(format!("Location verification failed: {reason}")),
        }
    }
}

/// Device-reported position, as delivered by a browser geolocation API
///
/// Treated as untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserGeolocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    /// Milliseconds since the Unix epoch on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Normalized answer from the IP geolocation resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<CountryCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeolocationResult {
    pub fn found(country_code: CountryCode, country_name: Option<String>, ip: Option<String>) -> Self {
        Self {
            success: true,
            country_code: Some(country_code),
            country_name,
            ip,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, ip: Option<String>) -> Self {
        Self {
            success: false,
            ip,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
