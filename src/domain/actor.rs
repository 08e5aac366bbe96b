//! Caller roles
//!
//! The role is resolved once at the request boundary and passed explicitly
//! into every service call.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Cross-channel visibility, refunds, restores and no-show marking.
    SuperAdmin,
    Admin,
    #[default]
    Staff,
}

impl ActorRole {
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "super_admin" | "superadmin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
