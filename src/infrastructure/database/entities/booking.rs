//! Booking entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub resource_id: String,

    /// Room | Event
    pub resource_kind: String,

    /// Confirmed, Pending, Cancelled, Attended, NoShow
    pub status: String,

    pub guest_name: String,
    pub attendee_or_guest_count: i32,

    /// Decimal string, e.g. "150.00"
    pub total_amount: String,

    pub scheduled_start: DateTimeUtc,

    /// Website | App
    pub source: String,

    /// JSON-encoded policy snapshot
    #[sea_orm(column_type = "Text")]
    pub refund_policy: String,

    /// JSON-encoded refund record
    #[sea_orm(column_type = "Text", nullable)]
    pub refund_record: Option<String>,

    /// JSON array of applied transitions
    #[sea_orm(column_type = "Text")]
    pub history: String,

    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
