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
                    .table(WebhookCalls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookCalls::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookCalls::WebhookId).uuid().not_null())
                    .col(ColumnDef::new(WebhookCalls::TeamId).uuid().not_null())
                    .col(ColumnDef::new(WebhookCalls::DeliveryId).uuid())
                    .col(ColumnDef::new(WebhookCalls::AttemptId).uuid())
                    .col(
                        ColumnDef::new(WebhookCalls::AttemptNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(WebhookCalls::EventType).string().not_null())
                    .col(ColumnDef::new(WebhookCalls::RequestPayload).json().not_null())
                    .col(ColumnDef::new(WebhookCalls::ResponseStatus).integer())
                    .col(ColumnDef::new(WebhookCalls::ResponseBody).text())
                    .col(ColumnDef::new(WebhookCalls::ErrorMessage).text())
                    .col(
                        ColumnDef::new(WebhookCalls::DurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WebhookCalls::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(WebhookCalls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhook_calls_webhook")
                            .from(WebhookCalls::Table, WebhookCalls::WebhookId)
                            .to(Webhooks::Table, Webhooks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_calls_team_created")
                    .table(WebhookCalls::Table)
                    .col(WebhookCalls::TeamId)
                    .col(WebhookCalls::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_calls_delivery")
                    .table(WebhookCalls::Table)
                    .col(WebhookCalls::DeliveryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookCalls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WebhookCalls {
    Table,
    Id,
    WebhookId,
    TeamId,
    DeliveryId,
    AttemptId,
    AttemptNumber,
    EventType,
    RequestPayload,
    ResponseStatus,
    ResponseBody,
    ErrorMessage,
    DurationMs,
    Status,
    CreatedAt,
}
