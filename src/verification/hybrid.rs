use crate::models::{LocationVerificationResult, RiskFlag, VerificationMethod};

use super::score::clamp_score;

const CORROBORATION_RELIEF: i32 = 10;
const DISAGREEMENT_RISK: i32 = 20;

/// Merge an IP result and a browser result into one hybrid verdict
///
/// Scores are averaged (rounded half up). Agreement on `verified: true`
/// lowers risk; disagreement raises it and forces `verified: false`.
pub fn combine_results(
    ip: LocationVerificationResult,
    browser: LocationVerificationResult,
) -> LocationVerificationResult {
    let average = (i32::from(ip.risk_score) + i32::from(browser.risk_score) + 1) / 2;

    let mut flags = ip.flags;
    flags.extend(browser.flags);

    let (verified, risk, message) = match (ip.verified, browser.verified) {
        (true, true) => (
            true,
            average - CORROBORATION_RELIEF,
            "IP address and device location both confirm the registered country",
        ),
        (false, false) => (
            false,
            average,
            "Neither IP address nor device location confirms the registered country",
        ),
        _ => {
            flags.insert(RiskFlag::VerificationMismatch);
            (
                false,
                average + DISAGREEMENT_RISK,
                "IP address and device location checks disagree",
            )
        }
    };

    LocationVerificationResult {
        verified,
        registered_country: ip.registered_country,
        detected_country: ip.detected_country,
        ip_address: ip.ip_address,
        verification_method: VerificationMethod::Hybrid,
        risk_score: clamp_score(risk),
        flags,
        message: Some(message.to_string()),
    }
}
