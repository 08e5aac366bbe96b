//! QR check-in scanning and scan audit trail

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
