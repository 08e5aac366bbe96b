//! Response envelope, error mapping and extractors shared by all modules

mod validated_json;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ActorRole, DomainError, ErrorKind};
use crate::shared::types::PaginatedResult;

pub use validated_json::{ValidatedJson, ValidatedJsonRejection};

/// Standard API response wrapper.
///
/// Success: `{"success": true, "data": {...}}`;
/// failure: `{"success": false, "data": null, "error": "...", "code": "NotFound"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: ErrorKind) -> Self {
        Self {
            code: Some(code),
            ..Self::error(message)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> From<PaginatedResult<T>> for PaginatedResponse<T> {
    fn from(p: PaginatedResult<T>) -> Self {
        Self {
            items: p.items,
            total: p.total,
            page: p.page,
            limit: p.limit,
            total_pages: p.total_pages,
        }
    }
}

/// Domain failure rendered as an HTTP error.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::IllegalTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
        ErrorKind::PolicyIneligible | ErrorKind::EventMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = ApiResponse::<()>::error_with_code(self.0.to_string(), kind);
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Role from an untrusted query parameter; unknown or missing means the
/// least-privileged role.
pub fn role_from_query(raw: Option<&str>) -> ActorRole {
    raw.and_then(ActorRole::parse).unwrap_or_default()
}
