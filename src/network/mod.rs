//! Address classification and client IP extraction

pub mod ip_extractor;
pub mod private;
pub mod reputation;

pub use ip_extractor::{anonymize_ip, get_ip_from_request};
pub use private::{is_private_address, is_private_ip};
pub use reputation::{HeuristicVpnDetector, VpnDetector};
