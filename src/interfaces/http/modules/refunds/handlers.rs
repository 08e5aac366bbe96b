//! Refund audit HTTP handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::application::{RefundAuditEntry, RefundGateway};
use crate::domain::DomainError;
use crate::interfaces::http::common::{ok, role_from_query, ApiResponse, ApiResult};

const DEFAULT_AUDIT_LIMIT: usize = 100;

#[derive(Clone)]
pub struct RefundAppState {
    pub refunds: Arc<RefundGateway>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RefundAuditQuery {
    /// Must be `super_admin`
    pub actor_role: Option<String>,
    /// Maximum entries to return (default 100)
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/v1/refunds/audit",
    tag = "Refunds",
    params(RefundAuditQuery),
    responses(
        (status = 200, description = "Recent refund attempts, newest first", body = ApiResponse<Vec<RefundAuditEntry>>),
        (status = 403, description = "Elevated role required")
    )
)]
pub async fn refund_audit(
    State(state): State<RefundAppState>,
    Query(query): Query<RefundAuditQuery>,
) -> ApiResult<Vec<RefundAuditEntry>> {
    let role = role_from_query(query.actor_role.as_deref());
    if !role.is_elevated() {
        return Err(DomainError::Unauthorized(
            "the refund audit trail requires an elevated role".into(),
        )
        .into());
    }
    ok(state
        .refunds
        .recent_attempts(query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT)))
}
