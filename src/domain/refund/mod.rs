//! Refund policy snapshot, refund records and the pure policy evaluator.

pub mod model;
pub mod policy;

pub use model::{RefundPolicy, RefundRecord, RefundStatus, RefundType};
pub use policy::{
    evaluate, evaluate_with_scale, round_half_up, IneligibleReason, RefundDecision,
    DEFAULT_CURRENCY_SCALE,
};
