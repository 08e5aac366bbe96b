use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ErrorKind;

/// Outcome of one scan. Produced for every scan, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanResult {
    pub success: bool,
    pub message: String,
    pub booking_id: Option<String>,
    pub guest_name: Option<String>,
    pub event_title: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Failure class; `None` on success and on duplicate scans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// The booking was already checked in
    #[serde(default)]
    pub duplicate: bool,
}

impl ScanResult {
    pub fn failure(message: impl Into<String>, kind: ErrorKind, now: DateTime<Utc>) -> Self {
        Self {
            success: false,
            message: message.into(),
            booking_id: None,
            guest_name: None,
            event_title: None,
            timestamp: now,
            error_kind: Some(kind),
            duplicate: false,
        }
    }
}
