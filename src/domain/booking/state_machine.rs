//! Booking status state machine
//!
//! Pure transition rules shared by room and event bookings. The
//! application layer (`BookingService`) is the only caller and is
//! responsible for per-booking mutual exclusion around `apply`.
//!
//! Event bookings:
//!
//! | From      | Transition | To        | Guard                      |
//! |-----------|------------|-----------|----------------------------|
//! | Confirmed | Cancel     | Cancelled |                            |
//! | Confirmed | CheckIn    | Attended  |                            |
//! | Confirmed | MarkNoShow | NoShow    | elevated, start has passed |
//! | Cancelled | Restore    | Confirmed | elevated                   |
//! | Attended  | CheckIn    | Attended  | duplicate, not re-applied  |
//!
//! Room bookings:
//!
//! | From              | Transition | To        | Guard    |
//! |-------------------|------------|-----------|----------|
//! | Pending           | Confirm    | Confirmed |          |
//! | Pending/Confirmed | Cancel     | Cancelled |          |
//! | Cancelled         | Restore    | Confirmed | elevated |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::model::{Booking, BookingStatus, ResourceKind, TransitionRecord};
use crate::domain::refund::{RefundRecord, RefundStatus};
use crate::domain::ActorRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookingTransition {
    Confirm,
    Cancel,
    CheckIn,
    MarkNoShow,
    Restore,
}

impl BookingTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirm => "Confirm",
            Self::Cancel => "Cancel",
            Self::CheckIn => "CheckIn",
            Self::MarkNoShow => "MarkNoShow",
            Self::Restore => "Restore",
        }
    }

    pub fn requires_elevated_role(&self) -> bool {
        matches!(self, Self::MarkNoShow | Self::Restore)
    }
}

impl std::fmt::Display for BookingTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is asking, and when.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub actor_role: ActorRole,
    pub now: DateTime<Utc>,
}

impl TransitionContext {
    pub fn new(actor_role: ActorRole) -> Self {
        Self {
            actor_role,
            now: Utc::now(),
        }
    }

    pub fn at(actor_role: ActorRole, now: DateTime<Utc>) -> Self {
        Self { actor_role, now }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status changed.
    Applied {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// The booking was already in the target status; nothing was written.
    Duplicate { status: BookingStatus },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Duplicate { .. } => "duplicate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {transition} a {from} booking: {reason}")]
    IllegalTransition {
        from: BookingStatus,
        transition: BookingTransition,
        reason: String,
    },

    #[error("{transition} requires an elevated role (caller is {role})")]
    Unauthorized {
        transition: BookingTransition,
        role: ActorRole,
    },

    #[error("Refund for booking {booking_id} is already approved and cannot be changed")]
    RefundFinalized { booking_id: String },
}

fn illegal(from: BookingStatus, transition: BookingTransition, reason: &str) -> TransitionError {
    TransitionError::IllegalTransition {
        from,
        transition,
        reason: reason.to_string(),
    }
}

/// Resolve the target status without touching the booking.
fn target_status(
    booking: &Booking,
    transition: BookingTransition,
    ctx: &TransitionContext,
) -> Result<Option<BookingStatus>, TransitionError> {
    use BookingStatus::*;
    use BookingTransition::*;

    if transition.requires_elevated_role() && !ctx.actor_role.is_elevated() {
        return Err(TransitionError::Unauthorized {
            transition,
            role: ctx.actor_role,
        });
    }

    let from = booking.status;
    let to = match (booking.resource_kind, from, transition) {
        (_, Cancelled, Restore) => Confirmed,
        (_, _, Restore) => return Err(illegal(from, transition, "only cancelled bookings can be restored")),

        (ResourceKind::Event, Confirmed, Cancel) => Cancelled,
        (ResourceKind::Room, Pending | Confirmed, Cancel) => Cancelled,

        (ResourceKind::Event, Attended, CheckIn) => return Ok(None),
        (ResourceKind::Event, Confirmed, CheckIn) => Attended,

        (ResourceKind::Event, Confirmed, MarkNoShow) if ctx.now < booking.scheduled_start => {
            return Err(illegal(from, transition, "the event has not started yet"))
        }
        (ResourceKind::Event, Confirmed, MarkNoShow) => NoShow,

        (ResourceKind::Room, Pending, Confirm) => Confirmed,

        (ResourceKind::Room, _, CheckIn | MarkNoShow) => {
            return Err(illegal(from, transition, "not applicable to room bookings"))
        }
        (ResourceKind::Event, _, Confirm) => {
            return Err(illegal(from, transition, "event bookings are confirmed on creation"))
        }
        (_, status, _) if status.is_terminal() => {
            return Err(illegal(from, transition, "booking is already finalized"))
        }
        _ => return Err(illegal(from, transition, "transition not permitted")),
    };

    Ok(Some(to))
}

/// Apply `transition` to `booking` in place.
///
/// A repeated `CheckIn` on an attended booking returns
/// [`TransitionOutcome::Duplicate`] and leaves the booking untouched.
/// On error the booking is unchanged.
pub fn apply(
    booking: &mut Booking,
    transition: BookingTransition,
    ctx: &TransitionContext,
) -> Result<TransitionOutcome, TransitionError> {
    let from = booking.status;
    let Some(to) = target_status(booking, transition, ctx)? else {
        return Ok(TransitionOutcome::Duplicate { status: from });
    };

    booking.status = to;
    booking.updated_at = ctx.now;
    booking.history.push(TransitionRecord {
        from,
        to,
        transition,
        actor_role: ctx.actor_role,
        at: ctx.now,
    });

    Ok(TransitionOutcome::Applied { from, to })
}

/// Attach a refund record. An approved record is immutable.
pub fn attach_refund(
    booking: &mut Booking,
    record: RefundRecord,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if let Some(existing) = &booking.refund_record {
        if existing.status == RefundStatus::Approved {
            return Err(TransitionError::RefundFinalized {
                booking_id: booking.id.clone(),
            });
        }
    }
    booking.refund_record = Some(record);
    booking.updated_at = now;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────
