use super::m20250101_000001_create_webhooks::Webhooks;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeliveryAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeliveryAttempts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DeliveryAttempts::DeliveryId).uuid().not_null())
                    .col(
                        ColumnDef::new(DeliveryAttempts::SubscriptionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeliveryAttempts::TeamId).uuid().not_null())
                    .col(ColumnDef::new(DeliveryAttempts::EventType).string().not_null())
                    .col(ColumnDef::new(DeliveryAttempts::Payload).json().not_null())
                    .col(
                        ColumnDef::new(DeliveryAttempts::AttemptNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(DeliveryAttempts::MaxAttempts)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(DeliveryAttempts::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryAttempts::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(DeliveryAttempts::ClaimedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(DeliveryAttempts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(DeliveryAttempts::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_delivery_attempts_webhook")
                            .from(DeliveryAttempts::Table, DeliveryAttempts::SubscriptionId)
                            .to(Webhooks::Table, Webhooks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Claim query: status = 'pending' AND scheduled_at <= now ORDER BY scheduled_at
        manager
            .create_index(
                Index::create()
                    .name("idx_delivery_attempts_ready")
                    .table(DeliveryAttempts::Table)
                    .col(DeliveryAttempts::Status)
                    .col(DeliveryAttempts::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_delivery_attempts_delivery")
                    .table(DeliveryAttempts::Table)
                    .col(DeliveryAttempts::DeliveryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeliveryAttempts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeliveryAttempts {
    Table,
    Id,
    DeliveryId,
    SubscriptionId,
    TeamId,
    EventType,
    Payload,
    AttemptNumber,
    MaxAttempts,
    ScheduledAt,
    Status,
    ClaimedAt,
    CreatedAt,
    CompletedAt,
}
