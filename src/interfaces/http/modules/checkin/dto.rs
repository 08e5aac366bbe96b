use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::ActorRole;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckInRequest {
    /// Raw scanned QR payload
    pub token: String,
    /// Scanner/session identifier; scans sharing one are processed in order
    #[serde(alias = "sessionId")]
    #[validate(length(min = 1, max = 64))]
    pub session_id: Option<String>,
    #[serde(default, alias = "actorRole")]
    pub actor_role: ActorRole,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentScansQuery {
    /// Maximum entries to return (default 50)
    pub limit: Option<usize>,
}
