//! JSON extractor that also runs `validator::Validate`
//!
//! Unparseable bodies are rejected with 400, bodies that parse but fail
//! validation with 422. Both use the `ApiResponse` envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;
use crate::domain::ErrorKind;

pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    JsonError(JsonRejection),
    ValidationError(ValidationErrors),
}

/// `field: message` pairs joined with `; `, sorted for stable output.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    parts.sort();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::JsonError(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON: {}", rejection.body_text()),
            ),
            Self::ValidationError(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
        };
        let body = ApiResponse::<()>::error_with_code(message, ErrorKind::MalformedInput);
        (status, Json(body)).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}
