//! Booking domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::state_machine::BookingTransition;
use crate::domain::refund::{RefundPolicy, RefundRecord};
use crate::domain::{ActorRole, DomainError, DomainResult};

/// Kind of bookable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ResourceKind {
    Room,
    Event,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Room => "Room",
            Self::Event => "Event",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Room" => Some(Self::Room),
            "Event" => Some(Self::Event),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking status
///
/// Event bookings use Confirmed / Cancelled / Attended / NoShow.
/// Room bookings use Confirmed / Pending / Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
    Attended,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Pending => "Pending",
            Self::Cancelled => "Cancelled",
            Self::Attended => "Attended",
            Self::NoShow => "NoShow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Confirmed" => Some(Self::Confirmed),
            "Pending" => Some(Self::Pending),
            "Cancelled" => Some(Self::Cancelled),
            "Attended" => Some(Self::Attended),
            "NoShow" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Terminal statuses only leave through an explicit restore (Cancelled)
    /// or not at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Attended | Self::NoShow)
    }

    pub fn is_valid_for(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Event => matches!(
                self,
                Self::Confirmed | Self::Cancelled | Self::Attended | Self::NoShow
            ),
            ResourceKind::Room => matches!(self, Self::Confirmed | Self::Pending | Self::Cancelled),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel the booking originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookingSource {
    Website,
    App,
}

impl BookingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "Website",
            Self::App => "App",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Website" => Some(Self::Website),
            "App" => Some(Self::App),
            _ => None,
        }
    }
}

/// One applied status change, kept with the booking for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransitionRecord {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub transition: BookingTransition,
    pub actor_role: ActorRole,
    pub at: DateTime<Utc>,
}

/// A reservation against a room type or an event.
///
/// Outbound payloads go through `application::visibility::BookingView`,
/// never through this type directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    pub status: BookingStatus,
    pub guest_name: String,
    pub attendee_or_guest_count: u32,
    /// Currency is implicit from hotel configuration
    pub total_amount: Decimal,
    /// Reference point for refund-window math
    pub scheduled_start: DateTime<Utc>,
    pub source: BookingSource,
    /// Snapshot taken at booking time
    pub refund_policy: RefundPolicy,
    pub refund_record: Option<RefundRecord>,
    pub history: Vec<TransitionRecord>,
    /// Optimistic-concurrency version, bumped by every successful save
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_event(&self) -> bool {
        self.resource_kind == ResourceKind::Event
    }

    pub fn is_room(&self) -> bool {
        self.resource_kind == ResourceKind::Room
    }
}

/// Booking handed over by the reservation flow.
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Generated when absent
    pub id: Option<String>,
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    pub guest_name: String,
    pub attendee_or_guest_count: u32,
    pub total_amount: Decimal,
    pub scheduled_start: DateTime<Utc>,
    pub source: BookingSource,
    pub refund_policy: RefundPolicy,
    /// Defaults to Confirmed; room bookings may start Pending
    pub initial_status: Option<BookingStatus>,
}

impl NewBooking {
    pub fn into_booking(self, now: DateTime<Utc>) -> DomainResult<Booking> {
        if self.resource_id.trim().is_empty() {
            return Err(DomainError::MalformedInput("resource_id must not be empty".into()));
        }
        if self.guest_name.trim().is_empty() {
            return Err(DomainError::MalformedInput("guest_name must not be empty".into()));
        }
        if self.attendee_or_guest_count == 0 {
            return Err(DomainError::MalformedInput(
                "attendee_or_guest_count must be at least 1".into(),
            ));
        }
        if self.total_amount.is_sign_negative() && !self.total_amount.is_zero() {
            return Err(DomainError::MalformedInput(
                "total_amount must not be negative".into(),
            ));
        }
        self.refund_policy.validate()?;

        let status = self.initial_status.unwrap_or(BookingStatus::Confirmed);
        let allowed_initial = match self.resource_kind {
            ResourceKind::Event => status == BookingStatus::Confirmed,
            ResourceKind::Room => {
                matches!(status, BookingStatus::Confirmed | BookingStatus::Pending)
            }
        };
        if !allowed_initial {
            return Err(DomainError::MalformedInput(format!(
                "{} bookings cannot start as {}",
                self.resource_kind, status
            )));
        }

        Ok(Booking {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            resource_id: self.resource_id,
            resource_kind: self.resource_kind,
            status,
            guest_name: self.guest_name,
            attendee_or_guest_count: self.attendee_or_guest_count,
            total_amount: self.total_amount,
            scheduled_start: self.scheduled_start,
            source: self.source,
            refund_policy: self.refund_policy,
            refund_record: None,
            history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn standard_policy(percentage: i64) -> RefundPolicy {
        RefundPolicy::Standard {
            is_refundable: true,
            window_days: 2,
            refund_percentage: Decimal::from(percentage),
        }
    }

    pub(crate) fn new_event_booking(id: &str) -> NewBooking {
        NewBooking {
            id: Some(id.to_string()),
            resource_id: "e1".into(),
            resource_kind: ResourceKind::Event,
            guest_name: "John Smith".into(),
            attendee_or_guest_count: 2,
            total_amount: Decimal::from(150),
            scheduled_start: Utc::now() + Duration::days(3),
            source: BookingSource::Website,
            refund_policy: standard_policy(100),
            initial_status: None,
        }
    }

    pub(crate) fn new_room_booking(id: &str) -> NewBooking {
        NewBooking {
            resource_id: "deluxe-king".into(),
            resource_kind: ResourceKind::Room,
            initial_status: Some(BookingStatus::Pending),
            source: BookingSource::App,
            ..new_event_booking(id)
        }
    }

    pub(crate) fn event_booking(id: &str) -> Booking {
        new_event_booking(id).into_booking(Utc::now()).unwrap()
    }

    pub(crate) fn room_booking(id: &str) -> Booking {
        new_room_booking(id).into_booking(Utc::now()).unwrap()
    }

    #[test]
    fn new_event_booking_starts_confirmed() {
        let b = event_booking("b1");
        assert_eq!(b.id, "b1");
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(b.version, 0);
        assert!(b.refund_record.is_none());
        assert!(b.history.is_empty());
    }

    #[test]
    fn room_booking_may_start_pending() {
        let b = room_booking("r1");
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.is_room());
    }

    #[test]
    fn event_booking_cannot_start_pending() {
        let mut nb = new_event_booking("b1");
        nb.initial_status = Some(BookingStatus::Pending);
        let err = nb.into_booking(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::MalformedInput(_)));
    }

    #[test]
    fn rejects_zero_guests_and_negative_amount() {
        let mut nb = new_event_booking("b1");
        nb.attendee_or_guest_count = 0;
        assert!(nb.into_booking(Utc::now()).is_err());

        let mut nb = new_event_booking("b1");
        nb.total_amount = Decimal::from(-1);
        assert!(nb.into_booking(Utc::now()).is_err());
    }

    #[test]
    fn missing_id_is_generated() {
        let mut nb = new_event_booking("");
        nb.id = None;
        let b = nb.into_booking(Utc::now()).unwrap();
        assert!(!b.id.is_empty());
    }

    #[test]
    fn status_sets_per_resource_kind() {
        assert!(BookingStatus::Attended.is_valid_for(ResourceKind::Event));
        assert!(!BookingStatus::Attended.is_valid_for(ResourceKind::Room));
        assert!(BookingStatus::Pending.is_valid_for(ResourceKind::Room));
        assert!(!BookingStatus::Pending.is_valid_for(ResourceKind::Event));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            BookingStatus::Attended,
            BookingStatus::NoShow,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("Expired"), None);
    }
}
