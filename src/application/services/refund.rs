//! Refund request gateway
//!
//! Authorization, then request validation, then policy evaluation, then an
//! approved [`RefundRecord`] attached through the booking service. Every
//! attempt, accepted or rejected, lands in the refund audit trail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::booking::BookingService;
use crate::domain::refund::{evaluate_with_scale, DEFAULT_CURRENCY_SCALE};
use crate::domain::{
    ActorRole, DomainError, DomainResult, ErrorKind, RefundDecision, RefundRecord, RefundStatus,
    RefundType, TransitionError,
};
use crate::shared::AuditTrail;

pub const DEFAULT_AUDIT_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub refund_type: RefundType,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefundReceipt {
    pub refund_id: String,
    pub booking_id: String,
    pub refund_type: RefundType,
    pub status: RefundStatus,
    pub computed_amount: Decimal,
    pub original_amount: Decimal,
    /// Percentage actually applied; absent for custom amounts
    pub applied_percentage: Option<Decimal>,
    /// The request asked for more than the policy grants
    pub downgraded: bool,
    pub currency: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefundAuditOutcome {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefundAuditEntry {
    pub booking_id: String,
    pub actor_role: ActorRole,
    /// Absent when the request body was malformed
    pub request: Option<RefundRequest>,
    pub outcome: RefundAuditOutcome,
    pub amount: Option<Decimal>,
    pub error_kind: Option<ErrorKind>,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RefundGatewayConfig {
    pub currency: String,
    pub currency_scale: u32,
    pub audit_history_limit: usize,
}

impl Default for RefundGatewayConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            currency_scale: DEFAULT_CURRENCY_SCALE,
            audit_history_limit: DEFAULT_AUDIT_HISTORY_LIMIT,
        }
    }
}

pub struct RefundGateway {
    bookings: Arc<BookingService>,
    audit: AuditTrail<RefundAuditEntry>,
    config: RefundGatewayConfig,
}

impl RefundGateway {
    pub fn new(bookings: Arc<BookingService>, config: RefundGatewayConfig) -> Self {
        Self {
            bookings,
            audit: AuditTrail::new(config.audit_history_limit),
            config,
        }
    }

    pub async fn request(
        &self,
        booking_id: &str,
        request: RefundRequest,
        actor_role: ActorRole,
    ) -> DomainResult<RefundReceipt> {
        let now = Utc::now();
        let result = self.process(booking_id, &request, actor_role, now).await;
        self.record(booking_id, actor_role, Some(request), result.as_ref(), now);
        result
    }

    /// Audit an attempt whose body never became a [`RefundRequest`], such as
    /// `Partial` without a percentage. Returns the error to hand back, which
    /// is `Unauthorized` for non-elevated callers as with any other attempt.
    pub fn reject_malformed(
        &self,
        booking_id: &str,
        actor_role: ActorRole,
        err: DomainError,
    ) -> DomainError {
        let err = match require_elevated(actor_role) {
            Ok(()) => err,
            Err(unauthorized) => unauthorized,
        };
        self.record(booking_id, actor_role, None, Err(&err), Utc::now());
        err
    }

    fn record(
        &self,
        booking_id: &str,
        actor_role: ActorRole,
        request: Option<RefundRequest>,
        result: Result<&RefundReceipt, &DomainError>,
        now: DateTime<Utc>,
    ) {
        let (outcome, amount, error_kind, message) = match result {
            Ok(receipt) => (
                RefundAuditOutcome::Approved,
                Some(receipt.computed_amount),
                None,
                format!("Refund of {} {} approved", receipt.computed_amount, receipt.currency),
            ),
            Err(e) => (RefundAuditOutcome::Rejected, None, Some(e.kind()), e.to_string()),
        };

        match result {
            Ok(receipt) => info!(
                booking_id,
                refund_id = %receipt.refund_id,
                amount = %receipt.computed_amount,
                downgraded = receipt.downgraded,
                "Refund approved"
            ),
            Err(e) => warn!(booking_id, %actor_role, error = %e, "Refund rejected"),
        }
        let label = error_kind.map_or("approved", |k| k.as_str());
        metrics::counter!("refund_requests_total", "result" => label).increment(1);

        self.audit.record(RefundAuditEntry {
            booking_id: booking_id.to_string(),
            actor_role,
            request,
            outcome,
            amount,
            error_kind,
            message,
            at: now,
        });
    }

    /// Most recent refund attempts, newest first.
    pub fn recent_attempts(&self, limit: usize) -> Vec<RefundAuditEntry> {
        self.audit.recent(limit)
    }

    async fn process(
        &self,
        booking_id: &str,
        request: &RefundRequest,
        actor_role: ActorRole,
        now: DateTime<Utc>,
    ) -> DomainResult<RefundReceipt> {
        require_elevated(actor_role)?;
        if request.reason.trim().is_empty() {
            return Err(DomainError::MalformedInput(
                "refund reason must not be empty".into(),
            ));
        }

        let scale = self.config.currency_scale;
        let downgraded = AtomicBool::new(false);
        let booking = self
            .bookings
            .attach_refund(booking_id, now, |booking| {
                if let Some(existing) = &booking.refund_record {
                    if existing.status == RefundStatus::Approved {
                        return Err(TransitionError::RefundFinalized {
                            booking_id: booking.id.clone(),
                        }
                        .into());
                    }
                }

                let decision = evaluate_with_scale(
                    &booking.refund_policy,
                    booking.scheduled_start,
                    now,
                    &request.refund_type,
                    booking.total_amount,
                    scale,
                )?;
                match decision {
                    RefundDecision::Ineligible { reason } => {
                        Err(DomainError::PolicyIneligible(reason))
                    }
                    RefundDecision::Eligible {
                        amount,
                        applied_percentage,
                        downgraded: was_downgraded,
                    } => {
                        downgraded.store(was_downgraded, Ordering::Relaxed);
                        Ok(RefundRecord {
                            id: uuid::Uuid::new_v4().to_string(),
                            requested_at: now,
                            refund_type: request.refund_type.clone(),
                            reason: request.reason.trim().to_string(),
                            computed_amount: amount,
                            applied_percentage,
                            status: RefundStatus::Approved,
                            actor_role,
                        })
                    }
                }
            })
            .await?;

        let record = booking.refund_record.as_ref().ok_or_else(|| {
            DomainError::Storage(format!("refund for booking {} was not persisted", booking.id))
        })?;

        Ok(RefundReceipt {
            refund_id: record.id.clone(),
            booking_id: booking.id.clone(),
            refund_type: record.refund_type.clone(),
            status: record.status,
            computed_amount: record.computed_amount,
            original_amount: booking.total_amount,
            applied_percentage: record.applied_percentage,
            downgraded: downgraded.load(Ordering::Relaxed),
            currency: self.config.currency.clone(),
            requested_at: record.requested_at,
        })
    }
}

fn require_elevated(actor_role: ActorRole) -> DomainResult<()> {
    if actor_role.is_elevated() {
        Ok(())
    } else {
        Err(DomainError::Unauthorized(format!(
            "refunds require an elevated role (caller is {})",
            actor_role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::domain::booking::model::tests::new_event_booking;
    use crate::domain::{
        BookingStatus, BookingTransition, IneligibleReason, RefundPolicy, TransitionContext,
    };
    use crate::infrastructure::storage::InMemoryBookingRepository;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn full(reason: &str) -> RefundRequest {
        RefundRequest {
            refund_type: RefundType::Full,
            reason: reason.into(),
        }
    }

    async fn gateway_with(policy: RefundPolicy, start_offset: Duration) -> (Arc<BookingService>, RefundGateway) {
        let bookings = Arc::new(BookingService::new(
            Arc::new(InMemoryBookingRepository::new()),
            create_event_bus(),
        ));
        let mut nb = new_event_booking("B1");
        nb.refund_policy = policy;
        nb.scheduled_start = Utc::now() + start_offset;
        bookings.register(nb).await.unwrap();
        let gateway = RefundGateway::new(bookings.clone(), RefundGatewayConfig::default());
        (bookings, gateway)
    }

    fn standard(is_refundable: bool, pct: &str) -> RefundPolicy {
        RefundPolicy::Standard {
            is_refundable,
            window_days: 2,
            refund_percentage: dec(pct),
        }
    }

    #[tokio::test]
    async fn full_refund_three_days_out() {
        let (bookings, gateway) = gateway_with(standard(true, "100"), Duration::days(3)).await;
        let receipt = gateway
            .request("B1", full("Guest cancelled"), ActorRole::SuperAdmin)
            .await
            .unwrap();
        assert_eq!(receipt.computed_amount, dec("150.00"));
        assert_eq!(receipt.status, RefundStatus::Approved);
        assert!(!receipt.downgraded);

        let stored = bookings.get("B1").await.unwrap();
        let record = stored.refund_record.unwrap();
        assert_eq!(record.computed_amount, dec("150.00"));
        assert_eq!(record.reason, "Guest cancelled");
    }

    #[tokio::test]
    async fn started_booking_is_ineligible_and_audited() {
        let (bookings, gateway) = gateway_with(standard(true, "100"), -Duration::hours(1)).await;
        let err = gateway
            .request("B1", full("Late"), ActorRole::SuperAdmin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::PolicyIneligible(IneligibleReason::AlreadyStarted)
        ));
        assert!(bookings.get("B1").await.unwrap().refund_record.is_none());

        let audit = gateway.recent_attempts(10);
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].outcome, RefundAuditOutcome::Rejected);
        assert_eq!(audit[0].error_kind, Some(ErrorKind::PolicyIneligible));
    }

    #[tokio::test]
    async fn non_elevated_caller_is_unauthorized() {
        let (_, gateway) = gateway_with(standard(true, "100"), Duration::days(3)).await;
        for role in [ActorRole::Admin, ActorRole::Staff] {
            let err = gateway.request("B1", full("x"), role).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
        }
    }

    #[tokio::test]
    async fn blank_reason_is_malformed() {
        let (_, gateway) = gateway_with(standard(true, "100"), Duration::days(3)).await;
        let err = gateway
            .request("B1", full("   "), ActorRole::SuperAdmin)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[tokio::test]
    async fn non_refundable_rejects_before_recording() {
        let (bookings, gateway) = gateway_with(standard(false, "100"), Duration::days(30)).await;
        let err = gateway
            .request("B1", full("Please"), ActorRole::SuperAdmin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::PolicyIneligible(IneligibleReason::NotRefundable)
        ));
        assert!(bookings.get("B1").await.unwrap().refund_record.is_none());

        // explicit custom override still goes through
        let receipt = gateway
            .request(
                "B1",
                RefundRequest {
                    refund_type: RefundType::Custom(dec("40")),
                    reason: "Goodwill".into(),
                },
                ActorRole::SuperAdmin,
            )
            .await
            .unwrap();
        assert_eq!(receipt.computed_amount, dec("40"));
        assert_eq!(receipt.applied_percentage, None);
    }

    #[tokio::test]
    async fn full_request_against_75_percent_is_downgraded() {
        let (_, gateway) = gateway_with(standard(true, "75"), Duration::days(10)).await;
        let receipt = gateway
            .request("B1", full("Change of plans"), ActorRole::SuperAdmin)
            .await
            .unwrap();
        assert_eq!(receipt.computed_amount, dec("112.50"));
        assert_eq!(receipt.applied_percentage, Some(dec("75")));
        assert!(receipt.downgraded);
    }

    #[tokio::test]
    async fn second_refund_is_rejected() {
        let (_, gateway) = gateway_with(standard(true, "100"), Duration::days(10)).await;
        gateway
            .request("B1", full("first"), ActorRole::SuperAdmin)
            .await
            .unwrap();
        let err = gateway
            .request("B1", full("second"), ActorRole::SuperAdmin)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalTransition);
        assert_eq!(gateway.recent_attempts(10).len(), 2);
    }

    #[tokio::test]
    async fn missing_booking_is_not_found() {
        let (_, gateway) = gateway_with(standard(true, "100"), Duration::days(10)).await;
        let err = gateway
            .request("nope", full("x"), ActorRole::SuperAdmin)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn malformed_body_is_audited() {
        let (bookings, gateway) = gateway_with(standard(true, "100"), Duration::days(10)).await;
        let shape = || DomainError::MalformedInput("Partial refunds need a percentage".into());

        let err = gateway.reject_malformed("B1", ActorRole::SuperAdmin, shape());
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        // authorization still wins over shape
        let err = gateway.reject_malformed("B1", ActorRole::Staff, shape());
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let audit = gateway.recent_attempts(10);
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].error_kind, Some(ErrorKind::Unauthorized));
        assert_eq!(audit[1].error_kind, Some(ErrorKind::MalformedInput));
        assert!(audit.iter().all(|e| e.request.is_none()));
        assert!(bookings.get("B1").await.unwrap().refund_record.is_none());
    }

    #[tokio::test]
    async fn custom_refund_ignores_booking_status() {
        let (bookings, gateway) = gateway_with(standard(true, "100"), Duration::days(10)).await;
        bookings
            .transition(
                "B1",
                BookingTransition::CheckIn,
                TransitionContext::new(ActorRole::Staff),
            )
            .await
            .unwrap();

        let receipt = gateway
            .request(
                "B1",
                RefundRequest {
                    refund_type: RefundType::Custom(dec("20")),
                    reason: "Noise complaint".into(),
                },
                ActorRole::SuperAdmin,
            )
            .await
            .unwrap();
        assert_eq!(receipt.computed_amount, dec("20"));
        assert_eq!(bookings.get("B1").await.unwrap().status, BookingStatus::Attended);
    }

    #[tokio::test]
    async fn restore_keeps_approved_refund() {
        let (bookings, gateway) = gateway_with(standard(true, "100"), Duration::days(10)).await;
        bookings
            .transition(
                "B1",
                BookingTransition::Cancel,
                TransitionContext::new(ActorRole::Staff),
            )
            .await
            .unwrap();
        gateway
            .request("B1", full("Cancelled"), ActorRole::SuperAdmin)
            .await
            .unwrap();

        bookings
            .transition(
                "B1",
                BookingTransition::Restore,
                TransitionContext::new(ActorRole::SuperAdmin),
            )
            .await
            .unwrap();

        let stored = bookings.get("B1").await.unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        let record = stored.refund_record.unwrap();
        assert_eq!(record.status, RefundStatus::Approved);
        assert_eq!(record.computed_amount, dec("150.00"));
    }
}
