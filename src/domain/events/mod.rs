//! Domain events
//!
//! Facts about booking changes. The EventBus implementation lives in
//! `application::events`.

pub mod types;

pub use types::{BookingTransitionEvent, Event, EventMessage, RefundApprovedEvent};
