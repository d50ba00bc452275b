// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::call_record::{CallOutcome, CallRecord};
use crate::domain::repositories::call_record_repository::{CallQuery, CallRecordRepository};
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaCallStatus;
use crate::infrastructure::database::entities::webhook_call;
use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 调用记录仓库实现
#[derive(Clone)]
pub struct CallRecordRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl CallRecordRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn require(&self, id: Uuid) -> Result<CallRecord, RepositoryError> {
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }
}

impl TryFrom<webhook_call::Model> for CallRecord {
    type Error = RepositoryError;

    fn try_from(model: webhook_call::Model) -> Result<Self, Self::Error> {
        let event_type = model
            .event_type
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("webhook call {}: {}", model.id, e)))?;

        Ok(Self {
            id: model.id,
            webhook_id: model.webhook_id,
            team_id: model.team_id,
            delivery_id: model.delivery_id,
            attempt_id: model.attempt_id,
            attempt_number: model.attempt_number,
            event_type,
            request_payload: model.request_payload,
            response_status: model.response_status,
            response_body: model.response_body,
            error_message: model.error_message,
            duration_ms: model.duration_ms,
            status: model.status.into(),
            created_at: model.created_at.into(),
        })
    }
}

impl From<&CallRecord> for webhook_call::ActiveModel {
    fn from(record: &CallRecord) -> Self {
        Self {
            id: Set(record.id),
            webhook_id: Set(record.webhook_id),
            team_id: Set(record.team_id),
            delivery_id: Set(record.delivery_id),
            attempt_id: Set(record.attempt_id),
            attempt_number: Set(record.attempt_number),
            event_type: Set(record.event_type.as_str().to_string()),
            request_payload: Set(record.request_payload.clone()),
            response_status: Set(record.response_status),
            response_body: Set(record.response_body.clone()),
            error_message: Set(record.error_message.clone()),
            duration_ms: Set(record.duration_ms),
            status: Set(record.status.into()),
            created_at: Set(record.created_at.fixed_offset()),
        }
    }
}

#[async_trait]
impl CallRecordRepository for CallRecordRepoImpl {
    async fn append(&self, record: &CallRecord) -> Result<CallRecord, RepositoryError> {
        webhook_call::ActiveModel::from(record)
            .insert(self.db.as_ref())
            .await?;
        Ok(record.clone())
    }

    async fn close(&self, id: Uuid, outcome: &CallOutcome) -> Result<CallRecord, RepositoryError> {
        let result = webhook_call::Entity::update_many()
            .col_expr(
                webhook_call::Column::Status,
                Expr::value(SeaCallStatus::from(outcome.status)),
            )
            .col_expr(
                webhook_call::Column::ResponseStatus,
                Expr::value(outcome.response_status),
            )
            .col_expr(
                webhook_call::Column::ResponseBody,
                Expr::value(outcome.response_body.clone()),
            )
            .col_expr(
                webhook_call::Column::ErrorMessage,
                Expr::value(outcome.error_message.clone()),
            )
            .col_expr(
                webhook_call::Column::DurationMs,
                Expr::value(outcome.duration_ms),
            )
            .filter(webhook_call::Column::Id.eq(id))
            .filter(webhook_call::Column::Status.eq(SeaCallStatus::Pending))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.require(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, RepositoryError> {
        webhook_call::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(CallRecord::try_from)
            .transpose()
    }

    async fn list(&self, query: &CallQuery) -> Result<Vec<CallRecord>, RepositoryError> {
        let mut select = webhook_call::Entity::find()
            .filter(webhook_call::Column::TeamId.eq(query.team_id));

        if let Some(webhook_id) = query.webhook_id {
            select = select.filter(webhook_call::Column::WebhookId.eq(webhook_id));
        }
        if let Some(status) = query.status {
            select = select.filter(webhook_call::Column::Status.eq(SeaCallStatus::from(status)));
        }
        if let Some(cursor_id) = query.cursor {
            let cursor = webhook_call::Entity::find_by_id(cursor_id)
                .filter(webhook_call::Column::TeamId.eq(query.team_id))
                .one(self.db.as_ref())
                .await?
                .ok_or(RepositoryError::NotFound)?;

            // Seek to (created_at, id) <= cursor in descending order
            select = select.filter(
                Condition::any()
                    .add(webhook_call::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(webhook_call::Column::CreatedAt.eq(cursor.created_at))
                            .add(webhook_call::Column::Id.lte(cursor.id)),
                    ),
            );
        }

        select
            .order_by_desc(webhook_call::Column::CreatedAt)
            .order_by_desc(webhook_call::Column::Id)
            .limit(query.limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(CallRecord::try_from)
            .collect()
    }

    async fn find_by_delivery(&self, delivery_id: Uuid) -> Result<Vec<CallRecord>, RepositoryError> {
        webhook_call::Entity::find()
            .filter(webhook_call::Column::DeliveryId.eq(delivery_id))
            .order_by_asc(webhook_call::Column::AttemptNumber)
            .order_by_asc(webhook_call::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(CallRecord::try_from)
            .collect()
    }
}
