//! Refund value objects

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ActorRole, DomainError, DomainResult};

/// Refund terms captured when the booking was made.
///
/// Later policy edits never reach an existing booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefundPolicy {
    Standard {
        is_refundable: bool,
        /// Minimum whole days before start for a policy-computed refund
        window_days: u32,
        /// 0–100
        refund_percentage: Decimal,
    },
    /// Free-text terms; refunds need a manually entered amount.
    Custom { text: String },
}

impl RefundPolicy {
    pub fn is_refundable(&self) -> bool {
        match self {
            Self::Standard { is_refundable, .. } => *is_refundable,
            Self::Custom { .. } => true,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Self::Standard {
            refund_percentage, ..
        } = self
        {
            if *refund_percentage < Decimal::ZERO || *refund_percentage > Decimal::ONE_HUNDRED {
                return Err(DomainError::MalformedInput(format!(
                    "refund_percentage must be within 0..=100, got {}",
                    refund_percentage
                )));
            }
        }
        Ok(())
    }
}

/// Requested refund shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "value")]
pub enum RefundType {
    Full,
    /// Percentage of the original amount, capped by the policy
    Partial(Decimal),
    /// Operator-entered amount, clamped to the original amount
    Custom(Decimal),
}

impl RefundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Partial(_) => "Partial",
            Self::Custom(_) => "Custom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RefundStatus {
    Approved,
    Declined,
    Pending,
}

/// Refund attached to a booking. Immutable once `Approved`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefundRecord {
    pub id: String,
    pub requested_at: DateTime<Utc>,
    pub refund_type: RefundType,
    pub reason: String,
    pub computed_amount: Decimal,
    /// Percentage actually applied; `None` for custom amounts
    pub applied_percentage: Option<Decimal>,
    pub status: RefundStatus,
    pub actor_role: ActorRole,
}
