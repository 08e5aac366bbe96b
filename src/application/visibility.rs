//! Read-side projection of bookings
//!
//! `source` is serialized only for elevated callers. Non-elevated payloads
//! do not contain the key at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    ActorRole, Booking, BookingSource, BookingStatus, RefundPolicy, RefundRecord, ResourceKind,
    TransitionRecord,
};
use crate::shared::types::PaginatedResult;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingView {
    pub id: String,
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    pub status: BookingStatus,
    pub guest_name: String,
    pub attendee_or_guest_count: u32,
    pub total_amount: Decimal,
    pub scheduled_start: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<BookingSource>,
    pub refund_policy: RefundPolicy,
    pub refund_record: Option<RefundRecord>,
    pub history: Vec<TransitionRecord>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingView {
    pub fn project(booking: Booking, viewer: ActorRole) -> Self {
        Self {
            source: viewer.is_elevated().then_some(booking.source),
            id: booking.id,
            resource_id: booking.resource_id,
            resource_kind: booking.resource_kind,
            status: booking.status,
            guest_name: booking.guest_name,
            attendee_or_guest_count: booking.attendee_or_guest_count,
            total_amount: booking.total_amount,
            scheduled_start: booking.scheduled_start,
            refund_policy: booking.refund_policy,
            refund_record: booking.refund_record,
            history: booking.history,
            version: booking.version,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }

    pub fn project_page(page: PaginatedResult<Booking>, viewer: ActorRole) -> PaginatedResult<Self> {
        page.map(|b| Self::project(b, viewer))
    }
}
