//! Device coordinate checks against the country bounding boxes

use crate::geography::{FakeCoordinate, GeoTables};
use crate::models::{BrowserGeolocation, LocationVerificationResult, RiskFlag, VerificationMethod};

use super::error::VerificationError;
use super::score::RiskTally;

/// Distance from a bounding-box edge still treated as border proximity (~50 km)
pub const BORDER_TOLERANCE_DEG: f64 = 0.5;
/// Fixes less precise than this add risk
pub const LOW_ACCURACY_METERS: f64 = 1000.0;
/// Consumer devices do not report sub-meter accuracy
const MIN_PLAUSIBLE_ACCURACY_METERS: f64 = 1.0;
/// Match radius around known fake coordinates (~100 m)
const FAKE_COORDINATE_RADIUS_DEG: f64 = 0.001;

const UNKNOWN_BOUNDARY_RISK: i32 = 50;
const OUTSIDE_BOUNDS_RISK: i32 = 50;
const NEAR_BORDER_RELIEF: i32 = 15;
const LOW_ACCURACY_RISK: i32 = 10;
const SPOOFING_RISK: i32 = 40;

/// Cheap spoofing heuristics
///
/// Misses sophisticated spoofing; never fires on ordinary GPS noise.
pub fn is_spoofed_location(loc: &BrowserGeolocation, fakes: &[FakeCoordinate]) -> bool {
    // Real fixes essentially never land on whole degrees
    let whole_degrees = loc.latitude.fract() == 0.0 || loc.longitude.fract() == 0.0;
    let too_precise = loc.accuracy < MIN_PLAUSIBLE_ACCURACY_METERS;
    let known_fake = fakes.iter().any(|fake| {
        (loc.latitude - fake.latitude).abs() <= FAKE_COORDINATE_RADIUS_DEG
            && (loc.longitude - fake.longitude).abs() <= FAKE_COORDINATE_RADIUS_DEG
    });

    whole_degrees || too_precise || known_fake
}

fn validate(loc: &BrowserGeolocation) -> Result<(), VerificationError> {
    let valid_position = loc.latitude.is_finite()
        && loc.longitude.is_finite()
        && (-90.0..=90.0).contains(&loc.latitude)
        && (-180.0..=180.0).contains(&loc.longitude);

    if !valid_position {
        return Err(VerificationError::InvalidCoordinate {
            latitude: loc.latitude,
            longitude: loc.longitude,
        });
    }

    if !loc.accuracy.is_finite() || loc.accuracy < 0.0 {
        return Err(VerificationError::InvalidAccuracy(loc.accuracy));
    }

    Ok(())
}

pub(crate) fn assess_browser(
    loc: &BrowserGeolocation,
    registered: &str,
    tables: &GeoTables,
) -> Result<LocationVerificationResult, VerificationError> {
    validate(loc)?;

    let Some(boundary) = tables.boundary(registered) else {
        let (risk_score, flags) =
            RiskTally::flagged(UNKNOWN_BOUNDARY_RISK, RiskFlag::CountryBoundariesUnknown)
                .into_parts();
        return Ok(LocationVerificationResult {
            verified: false,
            registered_country: registered.to_string(),
            detected_country: None,
            ip_address: None,
            verification_method: VerificationMethod::Browser,
            risk_score,
            flags,
            message: Some(format!(
                "No boundary data for {registered}, device location cannot be verified"
            )),
        });
    };

    let mut tally = RiskTally::default();

    let within = boundary.contains(loc.latitude, loc.longitude);
    if !within {
        tally.add(OUTSIDE_BOUNDS_RISK, RiskFlag::OutsideCountryBounds);
        if boundary.within_tolerance(loc.latitude, loc.longitude, BORDER_TOLERANCE_DEG) {
            tally.relieve(NEAR_BORDER_RELIEF, RiskFlag::NearBorder);
        }
    }

    if loc.accuracy > LOW_ACCURACY_METERS {
        tally.add(LOW_ACCURACY_RISK, RiskFlag::LowAccuracy);
    }

    if is_spoofed_location(loc, &tables.known_fake_coordinates) {
        tally.add(SPOOFING_RISK, RiskFlag::LocationSpoofingDetected);
    }

    let (risk_score, flags) = tally.into_parts();
    let verified = within && risk_score < 50;

    let message = if verified {
        "Device location is within the registered country".to_string()
    } else if within {
        "Device location is within the registered country but looks unreliable".to_string()
    } else {
        format!("Device location is outside {registered}")
    };

    Ok(LocationVerificationResult {
        verified,
        registered_country: registered.to_string(),
        detected_country: None,
        ip_address: None,
        verification_method: VerificationMethod::Browser,
        risk_score,
        flags,
        message: Some(message),
    })
}
