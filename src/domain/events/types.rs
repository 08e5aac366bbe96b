//! Booking lifecycle events
//!
//! Published after a change is persisted. Consumers (notifications,
//! reporting) live outside this crate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingStatus, BookingTransition, ResourceKind, TransitionRecord};
use crate::domain::refund::RefundType;
use crate::domain::ActorRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    BookingConfirmed(BookingTransitionEvent),
    BookingCancelled(BookingTransitionEvent),
    BookingCheckedIn(BookingTransitionEvent),
    BookingMarkedNoShow(BookingTransitionEvent),
    BookingRestored(BookingTransitionEvent),
    RefundApproved(RefundApprovedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BookingConfirmed(_) => "booking_confirmed",
            Event::BookingCancelled(_) => "booking_cancelled",
            Event::BookingCheckedIn(_) => "booking_checked_in",
            Event::BookingMarkedNoShow(_) => "booking_marked_no_show",
            Event::BookingRestored(_) => "booking_restored",
            Event::RefundApproved(_) => "refund_approved",
        }
    }

    pub fn booking_id(&self) -> &str {
        match self {
            Event::BookingConfirmed(e)
            | Event::BookingCancelled(e)
            | Event::BookingCheckedIn(e)
            | Event::BookingMarkedNoShow(e)
            | Event::BookingRestored(e) => &e.booking_id,
            Event::RefundApproved(e) => &e.booking_id,
        }
    }

    /// Event for an applied transition.
    pub fn from_transition(
        booking_id: &str,
        resource_id: &str,
        resource_kind: ResourceKind,
        record: &TransitionRecord,
    ) -> Self {
        let payload = BookingTransitionEvent {
            booking_id: booking_id.to_string(),
            resource_id: resource_id.to_string(),
            resource_kind,
            from: record.from,
            to: record.to,
            actor_role: record.actor_role,
            timestamp: record.at,
        };
        match record.transition {
            BookingTransition::Confirm => Event::BookingConfirmed(payload),
            BookingTransition::Cancel => Event::BookingCancelled(payload),
            BookingTransition::CheckIn => Event::BookingCheckedIn(payload),
            BookingTransition::MarkNoShow => Event::BookingMarkedNoShow(payload),
            BookingTransition::Restore => Event::BookingRestored(payload),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingTransitionEvent {
    pub booking_id: String,
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub actor_role: ActorRole,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundApprovedEvent {
    pub booking_id: String,
    pub refund_id: String,
    pub refund_type: RefundType,
    pub amount: Decimal,
    pub currency: String,
    pub actor_role: ActorRole,
    pub timestamp: DateTime<Utc>,
}

/// Envelope sent to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
