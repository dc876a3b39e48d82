mod location;

pub use location::{
    normalize_country_code, BrowserGeolocation, CountryCode, GeolocationResult,
    LocationVerificationResult, RiskFlag, VerificationMethod,
};
