//! Check-in HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use crate::application::CheckInVerifier;
use crate::domain::ScanResult;
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult, ValidatedJson};

use super::dto::*;

const DEFAULT_SCAN_LIMIT: usize = 50;

#[derive(Clone)]
pub struct CheckInAppState {
    pub verifier: Arc<CheckInVerifier>,
}

/// Failed scans are still `200`; the outcome is in `ScanResult.success`.
#[utoipa::path(
    post,
    path = "/api/v1/checkin",
    tag = "Check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Scan outcome, successful or not", body = ApiResponse<ScanResult>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn scan_token(
    State(state): State<CheckInAppState>,
    ValidatedJson(request): ValidatedJson<CheckInRequest>,
) -> ApiResult<ScanResult> {
    let result = match request.session_id.as_deref() {
        Some(session) => {
            state
                .verifier
                .scan_in_session(session, &request.token, request.actor_role)
                .await
        }
        None => state.verifier.scan(&request.token, request.actor_role).await,
    };
    ok(result)
}

#[utoipa::path(
    get,
    path = "/api/v1/checkin/scans",
    tag = "Check-in",
    params(RecentScansQuery),
    responses(
        (status = 200, description = "Recent scans, newest first", body = ApiResponse<Vec<ScanResult>>)
    )
)]
pub async fn recent_scans(
    State(state): State<CheckInAppState>,
    Query(query): Query<RecentScansQuery>,
) -> ApiResult<Vec<ScanResult>> {
    ok(state
        .verifier
        .recent_scans(query.limit.unwrap_or(DEFAULT_SCAN_LIMIT)))
}

/// Drops the ordering lock for a scanner session. Unknown sessions are a no-op.
#[utoipa::path(
    delete,
    path = "/api/v1/checkin/sessions/{session_id}",
    tag = "Check-in",
    params(("session_id" = String, Path, description = "Scanner session identifier")),
    responses(
        (status = 200, description = "Whether a session was open", body = ApiResponse<bool>)
    )
)]
pub async fn end_scan_session(
    State(state): State<CheckInAppState>,
    Path(session_id): Path<String>,
) -> ApiResult<bool> {
    ok(state.verifier.end_session(&session_id))
}
