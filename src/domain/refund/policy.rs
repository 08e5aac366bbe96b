//! Refund policy evaluator
//!
//! Pure: computes refund eligibility and amount from a policy snapshot,
//! the booking's scheduled start and the requested refund type.
//!
//! Rules, in order:
//! 1. A non-refundable policy rejects every non-custom request.
//! 2. A custom request pays the entered amount clamped to `[0, original]`,
//!    regardless of timing.
//! 3. Free-text policies reject every non-custom request.
//! 4. Whole days until start (floored) below zero reject the request, and so
//!    do days inside the policy window.
//! 5. `Full` pays the policy percentage (downgraded when below 100);
//!    `Partial(p)` pays `min(p, policy percentage)`.
//! 6. Amounts are rounded half-up to the currency scale and never exceed
//!    the original amount.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::{RefundPolicy, RefundType};
use crate::domain::{DomainError, DomainResult};

/// Minor-unit digits (cents)
pub const DEFAULT_CURRENCY_SCALE: u32 = 2;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibleReason {
    NotRefundable,
    ManualAmountRequired,
    AlreadyStarted,
    WindowClosed { days_until_start: i64, window_days: u32 },
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRefundable => write!(f, "the booking's refund policy is non-refundable"),
            Self::ManualAmountRequired => {
                write!(f, "the booking's custom policy requires a manually entered amount")
            }
            Self::AlreadyStarted => write!(f, "the booking has already started"),
            Self::WindowClosed {
                days_until_start,
                window_days,
            } => write!(
                f,
                "refunds close {} day(s) before start; {} day(s) remain",
                window_days, days_until_start
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RefundDecision {
    Eligible {
        amount: Decimal,
        /// Percentage actually applied; `None` for custom amounts
        applied_percentage: Option<Decimal>,
        /// The request asked for more than the policy allows
        downgraded: bool,
    },
    Ineligible { reason: IneligibleReason },
}

impl RefundDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Eligible { amount, .. } => Some(*amount),
            Self::Ineligible { .. } => None,
        }
    }

    fn ineligible(reason: IneligibleReason) -> Self {
        Self::Ineligible { reason }
    }
}

/// Round to `scale` digits, halves away from zero (half-up for the
/// non-negative amounts used here).
pub fn round_half_up(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Signed whole days from `now` until `start`, floored: one hour after the
/// start is day -1, one hour before it is day 0.
fn whole_days_until(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// [`evaluate_with_scale`] with the default two-digit currency scale.
pub fn evaluate(
    policy: &RefundPolicy,
    scheduled_start: DateTime<Utc>,
    now: DateTime<Utc>,
    requested: &RefundType,
    original_amount: Decimal,
) -> DomainResult<RefundDecision> {
    evaluate_with_scale(
        policy,
        scheduled_start,
        now,
        requested,
        original_amount,
        DEFAULT_CURRENCY_SCALE,
    )
}

/// Evaluate a refund request. Malformed requests (negative custom amount,
/// partial percentage outside 0..=100) are errors rather than decisions.
pub fn evaluate_with_scale(
    policy: &RefundPolicy,
    scheduled_start: DateTime<Utc>,
    now: DateTime<Utc>,
    requested: &RefundType,
    original_amount: Decimal,
    scale: u32,
) -> DomainResult<RefundDecision> {
    if original_amount < Decimal::ZERO {
        return Err(DomainError::MalformedInput(
            "original amount must not be negative".into(),
        ));
    }

    if let RefundType::Partial(pct) = requested {
        if *pct < Decimal::ZERO || *pct > Decimal::ONE_HUNDRED {
            return Err(DomainError::MalformedInput(format!(
                "partial refund percentage must be within 0..=100, got {}",
                pct
            )));
        }
    }

    if !policy.is_refundable() && !requested.is_custom() {
        return Ok(RefundDecision::ineligible(IneligibleReason::NotRefundable));
    }

    if let RefundType::Custom(custom_amount) = requested {
        if *custom_amount < Decimal::ZERO {
            return Err(DomainError::MalformedInput(
                "custom refund amount must not be negative".into(),
            ));
        }
        let amount = round_half_up((*custom_amount).min(original_amount), scale).min(original_amount);
        return Ok(RefundDecision::Eligible {
            amount,
            applied_percentage: None,
            downgraded: *custom_amount > original_amount,
        });
    }

    let RefundPolicy::Standard {
        window_days,
        refund_percentage,
        ..
    } = policy
    else {
        return Ok(RefundDecision::ineligible(
            IneligibleReason::ManualAmountRequired,
        ));
    };

    let days_until_start = whole_days_until(scheduled_start, now);
    if days_until_start < 0 {
        return Ok(RefundDecision::ineligible(IneligibleReason::AlreadyStarted));
    }
    if days_until_start < i64::from(*window_days) {
        return Ok(RefundDecision::ineligible(IneligibleReason::WindowClosed {
            days_until_start,
            window_days: *window_days,
        }));
    }

    let policy_pct = *refund_percentage;
    // Custom returned above, so anything but Partial is Full here.
    let (applied, downgraded) = match requested {
        RefundType::Partial(pct) => ((*pct).min(policy_pct), *pct > policy_pct),
        _ => (policy_pct, policy_pct < Decimal::ONE_HUNDRED),
    };

    let raw = original_amount * applied / Decimal::ONE_HUNDRED;
    let amount = round_half_up(raw, scale).min(original_amount);

    Ok(RefundDecision::Eligible {
        amount,
        applied_percentage: Some(applied),
        downgraded,
    })
}

// ── Tests ──────────────────────────────────────────────────────
