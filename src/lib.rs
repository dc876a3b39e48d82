pub mod api;
pub mod config;
pub mod geography;
pub mod geoip;
pub mod models;
pub mod network;
pub mod verification;

pub use models::{
    BrowserGeolocation, GeolocationResult, LocationVerificationResult, RiskFlag,
    VerificationMethod,
};
pub use verification::LocationVerifier;
