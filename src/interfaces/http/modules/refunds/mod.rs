//! Refund audit trail

pub mod handlers;

pub use handlers::*;
