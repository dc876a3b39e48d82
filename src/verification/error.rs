use thiserror::Error;

/// Input the pipeline cannot evaluate
#[derive(Debug, Error, PartialEq)]
pub enum VerificationError {
    #[error("malformed IP address '{0}'")]
    InvalidAddress(String),
    #[error("coordinate ({latitude}, {longitude}) is not a valid position")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("accuracy {0} is not a valid radius")]
    InvalidAccuracy(f64),
}
