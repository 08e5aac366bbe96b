//! Create bookings table
//!
//! Policy snapshot, refund record and transition history are JSON text;
//! `version` backs the optimistic lock.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::ResourceId).string().not_null())
                    .col(ColumnDef::new(Bookings::ResourceKind).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("Confirmed"),
                    )
                    .col(ColumnDef::new(Bookings::GuestName).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::AttendeeOrGuestCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Bookings::TotalAmount).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::ScheduledStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Source).string().not_null())
                    .col(ColumnDef::new(Bookings::RefundPolicy).text().not_null())
                    .col(ColumnDef::new(Bookings::RefundRecord).text())
                    .col(
                        ColumnDef::new(Bookings::History)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Bookings::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_resource")
                    .table(Bookings::Table)
                    .col(Bookings::ResourceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_status")
                    .table(Bookings::Table)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_scheduled_start")
                    .table(Bookings::Table)
                    .col(Bookings::ScheduledStart)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    ResourceId,
    ResourceKind,
    Status,
    GuestName,
    AttendeeOrGuestCount,
    TotalAmount,
    ScheduledStart,
    Source,
    RefundPolicy,
    RefundRecord,
    History,
    Version,
    CreatedAt,
    UpdatedAt,
}
