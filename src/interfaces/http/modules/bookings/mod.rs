//! Booking list/detail, registration, transitions, refunds and QR tokens

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
