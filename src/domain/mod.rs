//! Domain layer: booking lifecycle, refund policy and check-in tokens.
//!
//! Everything here is free of I/O. Repositories are traits implemented in
//! `infrastructure`.

pub mod actor;
pub mod booking;
pub mod checkin;
pub mod events;
pub mod refund;

pub use actor::ActorRole;
pub use booking::{
    Booking, BookingFilter, BookingRepository, BookingSource, BookingStatus, BookingTransition,
    NewBooking, ResourceKind, TransitionContext, TransitionError, TransitionOutcome,
    TransitionRecord,
};
pub use checkin::{CheckInToken, ScanResult, TokenError};
pub use events::{Event, EventMessage};
pub use refund::{
    IneligibleReason, RefundDecision, RefundPolicy, RefundRecord, RefundStatus, RefundType,
};

// Re-export the error taxonomy for convenience
pub use crate::shared::types::errors::{DomainError, DomainResult, ErrorKind};
