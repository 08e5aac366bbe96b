//! Booking aggregate
//!
//! Contains the Booking entity, the status state machine, and the
//! repository interface.

pub mod model;
pub mod repository;
pub mod state_machine;

pub use model::{Booking, BookingSource, BookingStatus, NewBooking, ResourceKind, TransitionRecord};
pub use repository::{BookingFilter, BookingRepository};
pub use state_machine::{
    attach_refund, BookingTransition, TransitionContext, TransitionError, TransitionOutcome,
};
