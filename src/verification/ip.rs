use std::net::IpAddr;
use tracing::debug;

use crate::config::FailurePolicy;
use crate::models::{normalize_country_code, LocationVerificationResult, RiskFlag, VerificationMethod};
use crate::network::anonymize_ip;

use super::engine::LocationVerifier;
use super::error::VerificationError;
use super::score::RiskTally;

const NO_IP_RISK: i32 = 50;
const VPN_RISK: i32 = 30;
const LOOKUP_FAILED_RISK: i32 = 60;
const MISMATCH_RISK: i32 = 40;
const NEIGHBOR_RELIEF: i32 = 10;
const SUSPICIOUS_PATTERN_RISK: i32 = 20;

fn ip_result(
    registered: &str,
    ip_address: Option<String>,
    detected_country: Option<String>,
    tally: RiskTally,
    verified_if_low_risk: bool,
    message: String,
) -> LocationVerificationResult {
    let (risk_score, flags) = tally.into_parts();

    LocationVerificationResult {
        verified: verified_if_low_risk && risk_score < 50,
        registered_country: registered.to_string(),
        detected_country,
        ip_address,
        verification_method: VerificationMethod::Ip,
        risk_score,
        flags,
        message: Some(message),
    }
}

impl LocationVerifier {
    /// IP signal: VPN heuristic, country lookup, country comparison
    pub(crate) async fn assess_ip(
        &self,
        ip: Option<&str>,
        registered: &str,
    ) -> Result<LocationVerificationResult, VerificationError> {
        let Some(raw) = ip.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(ip_result(
                registered,
                None,
                None,
                RiskTally::flagged(NO_IP_RISK, RiskFlag::NoIpAddress),
                false,
                "No IP address available for location verification".to_string(),
            ));
        };

        let addr: IpAddr = raw
            .parse()
            .map_err(|_| VerificationError::InvalidAddress(raw.to_string()))?;

        let mut tally = RiskTally::default();

        if self.vpn.is_vpn_or_proxy(addr) {
            debug!("VPN/proxy heuristic matched {}", anonymize_ip(addr));
            tally.add(VPN_RISK, RiskFlag::VpnDetected);
        }

        let geo = self.resolver.get_country_from_ip(Some(raw)).await;

        let detected = match geo.country_code {
            Some(code) if geo.success => normalize_country_code(&code),
            _ => {
                let tally = match self.failure_policy {
                    FailurePolicy::Reset => {
                        RiskTally::flagged(LOOKUP_FAILED_RISK, RiskFlag::GeolocationFailed)
                    }
                    FailurePolicy::Accumulate => {
                        tally.add(LOOKUP_FAILED_RISK, RiskFlag::GeolocationFailed);
                        tally
                    }
                };
                let reason = geo
                    .error
                    .unwrap_or_else(|| "geolocation lookup failed".to_string());
                return Ok(ip_result(
                    registered,
                    Some(raw.to_string()),
                    None,
                    tally,
                    false,
                    format!("Could not determine location from IP address: {reason}"),
                ));
            }
        };

        let countries_match = detected == registered;
        if !countries_match {
            tally.add(MISMATCH_RISK, RiskFlag::CountryMismatch);
            if self.tables.are_neighbors(registered, &detected) {
                tally.relieve(NEIGHBOR_RELIEF, RiskFlag::NeighboringCountry);
            }
        }

        if self.vpn.is_suspicious_pattern(addr) {
            tally.add(SUSPICIOUS_PATTERN_RISK, RiskFlag::SuspiciousIpPattern);
        }

        let message = if countries_match {
            format!("IP address location matches registered country {registered}")
        } else {
            format!("IP address located in {detected}, but account is registered in {registered}")
        };

        Ok(ip_result(
            registered,
            Some(raw.to_string()),
            Some(detected),
            tally,
            countries_match,
            message,
        ))
    }
}
