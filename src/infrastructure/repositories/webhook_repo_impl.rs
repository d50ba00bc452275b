// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{SubscriptionStatus, Webhook, WebhookEventType};
use crate::domain::repositories::webhook_repository::{
    FailureTally, RepositoryError, WebhookPatch, WebhookRepository,
};
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaSubscriptionStatus;
use crate::infrastructure::database::entities::webhook;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Webhook仓库实现
///
/// 基于SeaORM实现的订阅数据访问层
#[derive(Clone)]
pub struct WebhookRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl WebhookRepoImpl {
    /// 创建新的Webhook仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn require(&self, id: Uuid) -> Result<Webhook, RepositoryError> {
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }
}

fn event_types_to_json(event_types: &BTreeSet<WebhookEventType>) -> serde_json::Value {
    serde_json::Value::Array(
        event_types
            .iter()
            .map(|event_type| serde_json::Value::String(event_type.as_str().to_string()))
            .collect(),
    )
}

impl TryFrom<webhook::Model> for Webhook {
    type Error = RepositoryError;

    fn try_from(model: webhook::Model) -> Result<Self, Self::Error> {
        let event_types: BTreeSet<WebhookEventType> =
            serde_json::from_value(model.event_types).map_err(|e| {
                RepositoryError::Corrupt(format!("webhook {} event types: {}", model.id, e))
            })?;

        Ok(Self {
            id: model.id,
            team_id: model.team_id,
            url: model.url,
            secret: model.secret,
            event_types,
            status: model.status.into(),
            consecutive_failures: model.consecutive_failures,
            created_by_user_id: model.created_by_user_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<&Webhook> for webhook::ActiveModel {
    fn from(webhook: &Webhook) -> Self {
        Self {
            id: Set(webhook.id),
            team_id: Set(webhook.team_id),
            url: Set(webhook.url.clone()),
            secret: Set(webhook.secret.clone()),
            event_types: Set(event_types_to_json(&webhook.event_types)),
            status: Set(webhook.status.into()),
            consecutive_failures: Set(webhook.consecutive_failures),
            created_by_user_id: Set(webhook.created_by_user_id),
            created_at: Set(webhook.created_at.fixed_offset()),
            updated_at: Set(webhook.updated_at.fixed_offset()),
        }
    }
}

#[async_trait]
impl WebhookRepository for WebhookRepoImpl {
    async fn create_within_limit(
        &self,
        webhook: &Webhook,
        limit: u64,
    ) -> Result<Webhook, RepositoryError> {
        let txn = self.db.begin().await?;

        // Row locks cannot cover a team that has no rows yet
        if txn.get_database_backend() == DbBackend::Postgres {
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock(hashtext($1))",
                [webhook.team_id.to_string().into()],
            ))
            .await?;
        }

        let existing = webhook::Entity::find()
            .filter(webhook::Column::TeamId.eq(webhook.team_id))
            .filter(webhook::Column::Status.ne(SeaSubscriptionStatus::Deleted))
            .lock_exclusive()
            .all(&txn)
            .await?;

        if existing.len() as u64 >= limit {
            txn.rollback().await?;
            return Err(RepositoryError::LimitReached { limit });
        }

        webhook::ActiveModel::from(webhook).insert(&txn).await?;
        txn.commit().await?;

        Ok(webhook.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
        webhook::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Webhook::try_from)
            .transpose()
    }

    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Webhook>, RepositoryError> {
        webhook::Entity::find()
            .filter(webhook::Column::TeamId.eq(team_id))
            .filter(webhook::Column::Status.ne(SeaSubscriptionStatus::Deleted))
            .order_by_desc(webhook::Column::CreatedAt)
            .order_by_desc(webhook::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Webhook::try_from)
            .collect()
    }

    async fn find_active_for_event(
        &self,
        team_id: Uuid,
        event_type: WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        let candidates = webhook::Entity::find()
            .filter(webhook::Column::TeamId.eq(team_id))
            .filter(webhook::Column::Status.eq(SeaSubscriptionStatus::Active))
            .order_by_asc(webhook::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let mut matched = Vec::with_capacity(candidates.len());
        for model in candidates {
            let webhook = Webhook::try_from(model)?;
            if webhook.subscribes_to(event_type) {
                matched.push(webhook);
            }
        }
        Ok(matched)
    }

    async fn update(&self, id: Uuid, patch: &WebhookPatch) -> Result<Webhook, RepositoryError> {
        let mut update = webhook::Entity::update_many().col_expr(
            webhook::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        );
        if let Some(url) = patch.url.as_ref() {
            update = update.col_expr(webhook::Column::Url, Expr::value(url.clone()));
        }
        if let Some(event_types) = patch.event_types.as_ref() {
            update = update.col_expr(
                webhook::Column::EventTypes,
                Expr::value(event_types_to_json(event_types)),
            );
        }

        let result = update
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::Status.ne(SeaSubscriptionStatus::Deleted))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.require(id).await
    }

    async fn rotate_secret(&self, id: Uuid, secret: &str) -> Result<Webhook, RepositoryError> {
        let result = webhook::Entity::update_many()
            .col_expr(webhook::Column::Secret, Expr::value(secret.to_string()))
            .col_expr(
                webhook::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::Status.ne(SeaSubscriptionStatus::Deleted))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.require(id).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Webhook, RepositoryError> {
        let mut update = webhook::Entity::update_many()
            .col_expr(
                webhook::Column::Status,
                Expr::value(SeaSubscriptionStatus::from(status)),
            )
            .col_expr(
                webhook::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            );
        if status == SubscriptionStatus::Active {
            update = update.col_expr(webhook::Column::ConsecutiveFailures, Expr::value(0));
        }

        // A deleted subscription never leaves DELETED
        let result = update
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::Status.ne(SeaSubscriptionStatus::Deleted))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.require(id).await
    }

    async fn reset_failures(&self, id: Uuid) -> Result<(), RepositoryError> {
        webhook::Entity::update_many()
            .col_expr(webhook::Column::ConsecutiveFailures, Expr::value(0))
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::ConsecutiveFailures.ne(0))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn record_terminal_failure(
        &self,
        id: Uuid,
        threshold: i32,
    ) -> Result<FailureTally, RepositoryError> {
        let incremented = webhook::Entity::update_many()
            .col_expr(
                webhook::Column::ConsecutiveFailures,
                Expr::col(webhook::Column::ConsecutiveFailures).add(1),
            )
            .filter(webhook::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if incremented.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        // Only the caller whose update flips the status reports the transition
        let disabled = webhook::Entity::update_many()
            .col_expr(
                webhook::Column::Status,
                Expr::value(SeaSubscriptionStatus::Disabled),
            )
            .col_expr(
                webhook::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::Status.is_in([
                SeaSubscriptionStatus::Active,
                SeaSubscriptionStatus::Paused,
            ]))
            .filter(webhook::Column::ConsecutiveFailures.gte(threshold))
            .exec(self.db.as_ref())
            .await?
            .rows_affected
            == 1;

        let current = self.require(id).await?;
        Ok(FailureTally {
            consecutive_failures: current.consecutive_failures,
            disabled,
        })
    }
}
