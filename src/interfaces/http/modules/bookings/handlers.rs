//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::{BookingService, BookingView, RefundGateway, RefundReceipt};
use crate::domain::{CheckInToken, DomainError, TransitionContext};
use crate::interfaces::http::common::{
    ok, role_from_query, ApiError, ApiResponse, ApiResult, PaginatedResponse, ValidatedJson,
};

use super::dto::*;

#[derive(Clone)]
pub struct BookingAppState {
    pub bookings: Arc<BookingService>,
    pub refunds: Arc<RefundGateway>,
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Bookings, newest scheduled start first", body = ApiResponse<PaginatedResponse<BookingView>>)
    )
)]
pub async fn list_bookings(
    State(state): State<BookingAppState>,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<PaginatedResponse<BookingView>> {
    let viewer = role_from_query(query.actor_role.as_deref());
    let mut filter = query.filter();
    // Filtering by source would leak it through list membership.
    if !viewer.is_elevated() {
        filter.source = None;
    }
    let page = state.bookings.list(&filter).await?;
    ok(BookingView::project_page(page, viewer).into())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID"), ViewerQuery),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingView>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<BookingView> {
    let viewer = role_from_query(query.actor_role.as_deref());
    let booking = state.bookings.get(&id).await?;
    ok(BookingView::project(booking, viewer))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    params(ViewerQuery),
    responses(
        (status = 201, description = "Booking registered", body = ApiResponse<BookingView>),
        (status = 400, description = "Invalid booking"),
        (status = 409, description = "Booking ID already taken"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    Query(query): Query<ViewerQuery>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingView>>), ApiError> {
    let viewer = role_from_query(query.actor_role.as_deref());
    let booking = state.bookings.register(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BookingView::project(booking, viewer))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/transition",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Authoritative post-transition booking", body = ApiResponse<TransitionResponse>),
        (status = 403, description = "Role not permitted for this transition"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Illegal transition")
    )
)]
pub async fn transition_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<TransitionResponse> {
    let report = state
        .bookings
        .transition(&id, request.event, TransitionContext::new(request.actor_role))
        .await?;
    ok(TransitionResponse {
        outcome: report.outcome.as_str().to_string(),
        duplicate: !report.outcome.is_applied(),
        booking: BookingView::project(report.booking, request.actor_role),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/refund",
    tag = "Refunds",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = RefundHttpRequest,
    responses(
        (status = 200, description = "Refund approved", body = ApiResponse<RefundReceipt>),
        (status = 400, description = "Malformed refund request"),
        (status = 403, description = "Elevated role required"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Refund already approved"),
        (status = 422, description = "Refund not permitted by policy")
    )
)]
pub async fn request_refund(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
    Json(request): Json<RefundHttpRequest>,
) -> ApiResult<RefundReceipt> {
    let actor_role = request.actor_role;
    let request = request
        .into_request()
        .map_err(|e| state.refunds.reject_malformed(&id, actor_role, e))?;
    let receipt = state.refunds.request(&id, request, actor_role).await?;
    ok(receipt)
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}/checkin-token",
    tag = "Check-in",
    params(("id" = String, Path, description = "Booking ID"), CheckInTokenQuery),
    responses(
        (status = 200, description = "QR payload for the booking", body = ApiResponse<CheckInTokenResponse>),
        (status = 400, description = "Booking cannot be encoded"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_checkin_token(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
    Query(query): Query<CheckInTokenQuery>,
) -> ApiResult<CheckInTokenResponse> {
    let booking = state.bookings.get(&id).await?;
    if !booking.is_event() {
        return Err(DomainError::MalformedInput(format!(
            "booking {} is not an event booking",
            booking.id
        ))
        .into());
    }

    let title = query
        .event_title
        .unwrap_or_else(|| booking.resource_id.clone());
    let token = CheckInToken::for_booking(&booking, title)
        .and_then(|t| t.encode())
        .map_err(|e| DomainError::MalformedInput(e.to_string()))?;

    ok(CheckInTokenResponse {
        booking_id: booking.id,
        token,
    })
}
