//! Booking DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{BookingView, RefundRequest};
use crate::domain::{
    ActorRole, BookingFilter, BookingSource, BookingStatus, BookingTransition, DomainError,
    DomainResult, NewBooking, RefundPolicy, RefundType, ResourceKind,
};
use crate::shared::types::PaginationParams;

/// Booking handed over by the reservation flow
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Generated when omitted
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    #[validate(length(min = 1, max = 200))]
    pub guest_name: String,
    #[validate(range(min = 1, max = 10000))]
    pub attendee_or_guest_count: u32,
    pub total_amount: Decimal,
    pub scheduled_start: DateTime<Utc>,
    pub source: BookingSource,
    pub refund_policy: RefundPolicy,
    /// Room bookings may start `Pending`
    pub initial_status: Option<BookingStatus>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(r: CreateBookingRequest) -> Self {
        NewBooking {
            id: r.id,
            resource_id: r.resource_id,
            resource_kind: r.resource_kind,
            guest_name: r.guest_name,
            attendee_or_guest_count: r.attendee_or_guest_count,
            total_amount: r.total_amount,
            scheduled_start: r.scheduled_start,
            source: r.source,
            refund_policy: r.refund_policy,
            initial_status: r.initial_status,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    pub resource_id: Option<String>,
    pub resource_kind: Option<ResourceKind>,
    pub status: Option<BookingStatus>,
    /// Ignored unless the caller is `super_admin`
    pub source: Option<BookingSource>,
    /// Page number, 1-based
    pub page: Option<u32>,
    /// Page size (1-100, default 50)
    pub limit: Option<u32>,
    /// Caller role; `source` is only returned to `super_admin`
    pub actor_role: Option<String>,
}

impl ListBookingsQuery {
    pub fn filter(&self) -> BookingFilter {
        BookingFilter {
            resource_id: self.resource_id.clone(),
            resource_kind: self.resource_kind,
            status: self.status,
            source: self.source,
            pagination: PaginationParams::new(self.page, self.limit),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewerQuery {
    pub actor_role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub event: BookingTransition,
    #[serde(alias = "actorRole")]
    pub actor_role: ActorRole,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub booking: BookingView,
    /// `applied` or `duplicate`
    pub outcome: String,
    /// The booking was already in the target status
    pub duplicate: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub enum RefundKind {
    Full,
    Partial,
    Custom,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundHttpRequest {
    #[serde(rename = "type")]
    pub kind: RefundKind,
    /// Required for `Partial`
    pub percentage: Option<Decimal>,
    /// Required for `Custom`
    #[serde(alias = "customAmount")]
    pub custom_amount: Option<Decimal>,
    pub reason: String,
    #[serde(alias = "actorRole")]
    pub actor_role: ActorRole,
}

impl RefundHttpRequest {
    pub fn into_request(self) -> DomainResult<RefundRequest> {
        let refund_type = match self.kind {
            RefundKind::Full => RefundType::Full,
            RefundKind::Partial => RefundType::Partial(self.percentage.ok_or_else(|| {
                DomainError::MalformedInput("Partial refunds need a percentage".into())
            })?),
            RefundKind::Custom => RefundType::Custom(self.custom_amount.ok_or_else(|| {
                DomainError::MalformedInput("Custom refunds need a custom_amount".into())
            })?),
        };
        Ok(RefundRequest {
            refund_type,
            reason: self.reason,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckInTokenQuery {
    /// Printed after the last delimiter; defaults to the event id
    pub event_title: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInTokenResponse {
    pub booking_id: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refund_body(json: serde_json::Value) -> RefundHttpRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn partial_refund_needs_percentage() {
        let req = refund_body(serde_json::json!({
            "type": "Partial", "reason": "x", "actor_role": "super_admin"
        }));
        assert!(matches!(
            req.into_request(),
            Err(DomainError::MalformedInput(_))
        ));

        let req = refund_body(serde_json::json!({
            "type": "Partial", "percentage": 40, "reason": "x", "actor_role": "super_admin"
        }));
        assert_eq!(
            req.into_request().unwrap().refund_type,
            RefundType::Partial(Decimal::from(40))
        );
    }

    #[test]
    fn custom_refund_uses_custom_amount() {
        let req = refund_body(serde_json::json!({
            "type": "Custom", "custom_amount": "12.50", "reason": "Goodwill", "actor_role": "super_admin"
        }));
        let request = req.into_request().unwrap();
        assert_eq!(
            request.refund_type,
            RefundType::Custom(Decimal::new(1250, 2))
        );
        assert_eq!(request.reason, "Goodwill");
    }

    #[test]
    fn accepts_camel_case_keys() {
        let req = refund_body(serde_json::json!({
            "type": "Custom", "customAmount": 40, "reason": "Goodwill", "actorRole": "super_admin"
        }));
        assert_eq!(req.actor_role, ActorRole::SuperAdmin);
        assert_eq!(
            req.into_request().unwrap().refund_type,
            RefundType::Custom(Decimal::from(40))
        );
    }
}
