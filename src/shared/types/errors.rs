use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::booking::TransitionError;
use crate::domain::refund::IneligibleReason;

/// Stable classification of a failure, carried into audit records and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    NotFound,
    IllegalTransition,
    Unauthorized,
    MalformedInput,
    PolicyIneligible,
    EventMismatch,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::IllegalTransition => "IllegalTransition",
            Self::Unauthorized => "Unauthorized",
            Self::MalformedInput => "MalformedInput",
            Self::PolicyIneligible => "PolicyIneligible",
            Self::EventMismatch => "EventMismatch",
            Self::Conflict => "Conflict",
            Self::Storage => "Storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Refund not permitted: {0}")]
    PolicyIneligible(IneligibleReason),

    #[error("Booking {booking_id} belongs to event {actual}, not {expected}")]
    EventMismatch {
        booking_id: String,
        expected: String,
        actual: String,
    },

    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    Conflict {
        entity: &'static str,
        id: String,
        expected: i64,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn booking_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Booking",
            field: "id",
            value: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Transition(TransitionError::Unauthorized { .. }) => ErrorKind::Unauthorized,
            Self::Transition(_) => ErrorKind::IllegalTransition,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::PolicyIneligible(_) => ErrorKind::PolicyIneligible,
            Self::EventMismatch { .. } => ErrorKind::EventMismatch,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether re-reading the record and retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
