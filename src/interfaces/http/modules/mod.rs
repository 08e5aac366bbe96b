//! Feature modules: each owns its DTOs, handlers and handler state

pub mod bookings;
pub mod checkin;
pub mod health;
pub mod metrics;
pub mod refunds;
