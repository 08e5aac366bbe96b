//! Booking lifecycle service
//!
//! Owns every write to a booking. Each change is a read-modify-write guarded
//! by the booking's version; a version conflict re-reads the booking and
//! re-applies the change, so a racing writer's result is always observed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::application::events::{Event, RefundApprovedEvent, SharedEventBus};
use crate::domain::booking::state_machine;
use crate::domain::{
    Booking, BookingFilter, BookingRepository, BookingTransition, DomainError, DomainResult,
    NewBooking, RefundRecord, RefundStatus, TransitionContext, TransitionOutcome,
};
use crate::shared::retry::{retry_with_backoff, RetryConfig};
use crate::shared::types::PaginatedResult;

pub const DEFAULT_MAX_TRANSITION_RETRIES: u32 = 3;

/// Result of a transition request.
#[derive(Debug, Clone)]
pub struct TransitionReport {
    /// Authoritative post-state
    pub booking: Booking,
    pub outcome: TransitionOutcome,
}

pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    events: SharedEventBus,
    retry: RetryConfig,
    currency: String,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>, events: SharedEventBus) -> Self {
        Self {
            repo,
            events,
            retry: RetryConfig::for_conflicts(DEFAULT_MAX_TRANSITION_RETRIES),
            currency: "USD".to_string(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = RetryConfig::for_conflicts(max_retries);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    /// Accept a booking from the reservation flow.
    pub async fn register(&self, new_booking: NewBooking) -> DomainResult<Booking> {
        let booking = new_booking.into_booking(Utc::now())?;
        let booking = self.repo.insert(booking).await?;
        info!(
            booking_id = %booking.id,
            resource_id = %booking.resource_id,
            kind = %booking.resource_kind,
            status = %booking.status,
            "Booking registered"
        );
        Ok(booking)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Booking> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| DomainError::booking_not_found(id))
    }

    pub async fn list(&self, filter: &BookingFilter) -> DomainResult<PaginatedResult<Booking>> {
        self.repo.list(filter).await
    }

    /// Apply a lifecycle transition.
    ///
    /// A repeated `CheckIn` succeeds with [`TransitionOutcome::Duplicate`]
    /// and writes nothing.
    pub async fn transition(
        &self,
        id: &str,
        transition: BookingTransition,
        ctx: TransitionContext,
    ) -> DomainResult<TransitionReport> {
        let result = self
            .update(id, "booking_transition", |booking| {
                let outcome = state_machine::apply(booking, transition, &ctx)?;
                Ok((outcome, outcome.is_applied()))
            })
            .await;

        match &result {
            Ok((booking, outcome)) => {
                metrics::counter!(
                    "booking_transitions_total",
                    "transition" => transition.as_str(),
                    "outcome" => outcome.as_str()
                )
                .increment(1);

                if outcome.is_applied() {
                    info!(
                        booking_id = %booking.id,
                        %transition,
                        status = %booking.status,
                        actor_role = %ctx.actor_role,
                        "Booking transition applied"
                    );
                    if let Some(record) = booking.history.last() {
                        self.events.publish(Event::from_transition(
                            &booking.id,
                            &booking.resource_id,
                            booking.resource_kind,
                            record,
                        ));
                    }
                } else {
                    debug!(booking_id = %booking.id, %transition, "Duplicate transition ignored");
                }
            }
            Err(e) => {
                metrics::counter!(
                    "booking_transitions_total",
                    "transition" => transition.as_str(),
                    "outcome" => e.kind().as_str()
                )
                .increment(1);
                warn!(booking_id = id, %transition, error = %e, "Booking transition rejected");
            }
        }

        result.map(|(booking, outcome)| TransitionReport { booking, outcome })
    }

    /// Attach a refund record built from the current booking state.
    ///
    /// `build` runs against a fresh read on every attempt; an error from it
    /// aborts without writing.
    pub async fn attach_refund<F>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        build: F,
    ) -> DomainResult<Booking>
    where
        F: Fn(&Booking) -> DomainResult<RefundRecord> + Send + Sync,
    {
        let (booking, ()) = self
            .update(id, "attach_refund", |booking| {
                let record = build(booking)?;
                state_machine::attach_refund(booking, record, now)?;
                Ok(((), true))
            })
            .await?;

        if let Some(record) = &booking.refund_record {
            info!(
                booking_id = %booking.id,
                refund_id = %record.id,
                amount = %record.computed_amount,
                status = ?record.status,
                "Refund recorded"
            );
            if record.status == RefundStatus::Approved {
                self.events.publish(Event::RefundApproved(RefundApprovedEvent {
                    booking_id: booking.id.clone(),
                    refund_id: record.id.clone(),
                    refund_type: record.refund_type.clone(),
                    amount: record.computed_amount,
                    currency: self.currency.clone(),
                    actor_role: record.actor_role,
                    timestamp: record.requested_at,
                }));
            }
        }
        Ok(booking)
    }

    /// Versioned read-modify-write. `change` returns a value plus whether
    /// the booking needs saving.
    async fn update<T, F>(&self, id: &str, operation: &str, change: F) -> DomainResult<(Booking, T)>
    where
        F: Fn(&mut Booking) -> DomainResult<(T, bool)> + Send + Sync,
        T: Send,
    {
        let repo = &self.repo;
        let change = &change;
        retry_with_backoff(
            &self.retry,
            || async move {
                let mut booking = repo
                    .get(id)
                    .await?
                    .ok_or_else(|| DomainError::booking_not_found(id))?;
                let expected_version = booking.version;
                let (value, dirty) = change(&mut booking)?;
                if !dirty {
                    return Ok((booking, value));
                }
                let saved = repo.save(booking, expected_version).await?;
                Ok((saved, value))
            },
            DomainError::is_retryable,
            operation,
        )
        .await
    }
}
