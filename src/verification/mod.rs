//! Location and fraud-risk verification
//!
//! Each signal (IP address, device coordinate) is scored independently and
//! combined when both are present. Public entry points never fail: every
//! problem becomes an unverified result with flags and a message.

mod browser;
mod engine;
mod error;
mod hybrid;
mod ip;
mod score;

pub use browser::{is_spoofed_location, BORDER_TOLERANCE_DEG, LOW_ACCURACY_METERS};
pub use engine::LocationVerifier;
pub use error::VerificationError;
pub use hybrid::combine_results;
