//! Application services

mod booking;
mod checkin;
mod refund;

pub use booking::{BookingService, TransitionReport, DEFAULT_MAX_TRANSITION_RETRIES};
pub use checkin::{CheckInVerifier, DEFAULT_SCAN_HISTORY_LIMIT};
pub use refund::{
    RefundAuditEntry, RefundAuditOutcome, RefundGateway, RefundGatewayConfig, RefundReceipt,
    RefundRequest, DEFAULT_AUDIT_HISTORY_LIMIT,
};
