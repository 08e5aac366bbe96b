//! SeaORM implementation of BookingRepository

use std::str::FromStr;

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::domain::{
    Booking, BookingFilter, BookingRepository, BookingSource, BookingStatus, DomainError,
    DomainResult, ResourceKind,
};
use crate::infrastructure::database::entities::booking;
use crate::shared::types::{InfraError, PaginatedResult};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn corrupt(id: &str, what: &str, value: &str) -> InfraError {
    InfraError::Corrupt(format!("booking {}: {}={}", id, what, value))
}

fn model_to_domain(m: booking::Model) -> Result<Booking, InfraError> {
    let resource_kind = ResourceKind::parse(&m.resource_kind)
        .ok_or_else(|| corrupt(&m.id, "resource_kind", &m.resource_kind))?;
    let status =
        BookingStatus::parse(&m.status).ok_or_else(|| corrupt(&m.id, "status", &m.status))?;
    let source =
        BookingSource::parse(&m.source).ok_or_else(|| corrupt(&m.id, "source", &m.source))?;
    let total_amount = Decimal::from_str(&m.total_amount)
        .map_err(|_| corrupt(&m.id, "total_amount", &m.total_amount))?;
    let attendee_or_guest_count = u32::try_from(m.attendee_or_guest_count).map_err(|_| {
        corrupt(
            &m.id,
            "attendee_or_guest_count",
            &m.attendee_or_guest_count.to_string(),
        )
    })?;

    Ok(Booking {
        resource_kind,
        status,
        source,
        total_amount,
        attendee_or_guest_count,
        refund_policy: serde_json::from_str(&m.refund_policy)?,
        refund_record: m
            .refund_record
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        history: serde_json::from_str(&m.history)?,
        id: m.id,
        resource_id: m.resource_id,
        guest_name: m.guest_name,
        scheduled_start: m.scheduled_start,
        version: m.version,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(b: &Booking) -> Result<booking::ActiveModel, InfraError> {
    Ok(booking::ActiveModel {
        id: Set(b.id.clone()),
        resource_id: Set(b.resource_id.clone()),
        resource_kind: Set(b.resource_kind.as_str().to_string()),
        status: Set(b.status.as_str().to_string()),
        guest_name: Set(b.guest_name.clone()),
        attendee_or_guest_count: Set(count_to_column(b.attendee_or_guest_count)?),
        total_amount: Set(b.total_amount.to_string()),
        scheduled_start: Set(b.scheduled_start),
        source: Set(b.source.as_str().to_string()),
        refund_policy: Set(serde_json::to_string(&b.refund_policy)?),
        refund_record: Set(b
            .refund_record
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?),
        history: Set(serde_json::to_string(&b.history)?),
        version: Set(b.version),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    })
}

fn count_to_column(count: u32) -> Result<i32, InfraError> {
    i32::try_from(count)
        .map_err(|_| InfraError::Corrupt(format!("attendee_or_guest_count {} out of range", count)))
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::from(e).into()
}

fn filter_condition(filter: &BookingFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(resource_id) = &filter.resource_id {
        condition = condition.add(booking::Column::ResourceId.eq(resource_id.as_str()));
    }
    if let Some(kind) = filter.resource_kind {
        condition = condition.add(booking::Column::ResourceKind.eq(kind.as_str()));
    }
    if let Some(status) = filter.status {
        condition = condition.add(booking::Column::Status.eq(status.as_str()));
    }
    if let Some(source) = filter.source {
        condition = condition.add(booking::Column::Source.eq(source.as_str()));
    }
    condition
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn get(&self, id: &str) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain).transpose()?)
    }

    async fn list(&self, filter: &BookingFilter) -> DomainResult<PaginatedResult<Booking>> {
        let query = booking::Entity::find().filter(filter_condition(filter));
        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let p = filter.pagination;
        let models = query
            .order_by_desc(booking::Column::ScheduledStart)
            .order_by_asc(booking::Column::Id)
            .offset(p.offset() as u64)
            .limit(p.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models
            .into_iter()
            .map(model_to_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResult::new(items, total, p.page, p.limit))
    }

    async fn insert(&self, b: Booking) -> DomainResult<Booking> {
        debug!("Inserting booking: {}", b.id);

        let model = domain_to_active(&b)?;
        match model.insert(&self.db).await {
            Ok(_) => Ok(b),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DomainError::Conflict {
                    entity: "Booking",
                    id: b.id,
                    expected: b.version,
                })
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn save(&self, mut b: Booking, expected_version: i64) -> DomainResult<Booking> {
        debug!(
            "Saving booking: {} (version {} -> {})",
            b.id,
            expected_version,
            expected_version + 1
        );

        b.version = expected_version + 1;
        let refund_record = b
            .refund_record
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(InfraError::from)?;
        let history = serde_json::to_string(&b.history).map_err(InfraError::from)?;

        // conditional update: only the writer holding the current version wins
        let result = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(b.status.as_str()))
            .col_expr(booking::Column::GuestName, Expr::value(b.guest_name.clone()))
            .col_expr(
                booking::Column::AttendeeOrGuestCount,
                Expr::value(count_to_column(b.attendee_or_guest_count)?),
            )
            .col_expr(booking::Column::TotalAmount, Expr::value(b.total_amount.to_string()))
            .col_expr(booking::Column::ScheduledStart, Expr::value(b.scheduled_start))
            .col_expr(booking::Column::RefundRecord, Expr::value(refund_record))
            .col_expr(booking::Column::History, Expr::value(history))
            .col_expr(booking::Column::Version, Expr::value(b.version))
            .col_expr(booking::Column::UpdatedAt, Expr::value(b.updated_at))
            .filter(booking::Column::Id.eq(b.id.as_str()))
            .filter(booking::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let exists = booking::Entity::find_by_id(b.id.clone())
                .one(&self.db)
                .await
                .map_err(db_err)?
                .is_some();
            return Err(if exists {
                DomainError::Conflict {
                    entity: "Booking",
                    id: b.id,
                    expected: expected_version,
                }
            } else {
                DomainError::booking_not_found(b.id)
            });
        }

        Ok(b)
    }
}
