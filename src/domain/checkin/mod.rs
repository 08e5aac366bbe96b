//! QR check-in tokens and scan results

pub mod scan;
pub mod token;

pub use scan::ScanResult;
pub use token::{CheckInToken, TokenError, MAX_TOKEN_LEN, TOKEN_PREFIX};
