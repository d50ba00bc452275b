// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use crate::domain::repositories::delivery_attempt_repository::DeliveryAttemptRepository;
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::infrastructure::database::entities::delivery_attempt;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaAttemptStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 投递尝试仓库实现
///
/// 领取通过逐行的 PENDING→IN_FLIGHT 条件更新完成，
/// 只有 `rows_affected == 1` 的调用者拿到该尝试
#[derive(Clone)]
pub struct DeliveryAttemptRepoImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl DeliveryAttemptRepoImpl {
    /// 创建新的投递尝试仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<delivery_attempt::Model> for DeliveryAttempt {
    type Error = RepositoryError;

    fn try_from(model: delivery_attempt::Model) -> Result<Self, Self::Error> {
        let event_type = model.event_type.parse().map_err(|e| {
            RepositoryError::Corrupt(format!("delivery attempt {}: {}", model.id, e))
        })?;

        Ok(Self {
            id: model.id,
            delivery_id: model.delivery_id,
            subscription_id: model.subscription_id,
            team_id: model.team_id,
            event_type,
            payload: model.payload,
            attempt_number: model.attempt_number,
            max_attempts: model.max_attempts,
            scheduled_at: model.scheduled_at.into(),
            status: model.status.into(),
            claimed_at: model.claimed_at.map(Into::into),
            created_at: model.created_at.into(),
            completed_at: model.completed_at.map(Into::into),
        })
    }
}

impl From<&DeliveryAttempt> for delivery_attempt::ActiveModel {
    fn from(attempt: &DeliveryAttempt) -> Self {
        Self {
            id: Set(attempt.id),
            delivery_id: Set(attempt.delivery_id),
            subscription_id: Set(attempt.subscription_id),
            team_id: Set(attempt.team_id),
            event_type: Set(attempt.event_type.as_str().to_string()),
            payload: Set(attempt.payload.clone()),
            attempt_number: Set(attempt.attempt_number),
            max_attempts: Set(attempt.max_attempts),
            scheduled_at: Set(attempt.scheduled_at.fixed_offset()),
            status: Set(attempt.status.into()),
            claimed_at: Set(attempt.claimed_at.map(|t| t.fixed_offset())),
            created_at: Set(attempt.created_at.fixed_offset()),
            completed_at: Set(attempt.completed_at.map(|t| t.fixed_offset())),
        }
    }
}

#[async_trait]
impl DeliveryAttemptRepository for DeliveryAttemptRepoImpl {
    async fn create(&self, attempt: &DeliveryAttempt) -> Result<DeliveryAttempt, RepositoryError> {
        delivery_attempt::ActiveModel::from(attempt)
            .insert(self.db.as_ref())
            .await?;
        Ok(attempt.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryAttempt>, RepositoryError> {
        delivery_attempt::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(DeliveryAttempt::try_from)
            .transpose()
    }

    async fn find_by_delivery(
        &self,
        delivery_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, RepositoryError> {
        delivery_attempt::Entity::find()
            .filter(delivery_attempt::Column::DeliveryId.eq(delivery_id))
            .order_by_asc(delivery_attempt::Column::AttemptNumber)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(DeliveryAttempt::try_from)
            .collect()
    }

    async fn claim_ready(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<DeliveryAttempt>, RepositoryError> {
        let now_fixed = now.fixed_offset();
        let candidates = delivery_attempt::Entity::find()
            .filter(delivery_attempt::Column::Status.eq(SeaAttemptStatus::Pending))
            .filter(delivery_attempt::Column::ScheduledAt.lte(now_fixed))
            .order_by_asc(delivery_attempt::Column::ScheduledAt)
            .order_by_asc(delivery_attempt::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        let mut claimed = Vec::with_capacity(candidates.len());
        for model in candidates {
            let result = delivery_attempt::Entity::update_many()
                .col_expr(
                    delivery_attempt::Column::Status,
                    Expr::value(SeaAttemptStatus::InFlight),
                )
                .col_expr(
                    delivery_attempt::Column::ClaimedAt,
                    Expr::value(Some(now_fixed)),
                )
                .filter(delivery_attempt::Column::Id.eq(model.id))
                .filter(delivery_attempt::Column::Status.eq(SeaAttemptStatus::Pending))
                .exec(self.db.as_ref())
                .await?;

            // Another worker won this row
            if result.rows_affected != 1 {
                continue;
            }

            let mut attempt = DeliveryAttempt::try_from(model)?;
            attempt.status = AttemptStatus::InFlight;
            attempt.claimed_at = Some(now);
            claimed.push(attempt);
        }

        Ok(claimed)
    }

    async fn finish(&self, id: Uuid, status: AttemptStatus) -> Result<bool, RepositoryError> {
        let result = delivery_attempt::Entity::update_many()
            .col_expr(
                delivery_attempt::Column::Status,
                Expr::value(SeaAttemptStatus::from(status)),
            )
            .col_expr(
                delivery_attempt::Column::CompletedAt,
                Expr::value(Some(Utc::now().fixed_offset())),
            )
            .filter(delivery_attempt::Column::Id.eq(id))
            .filter(delivery_attempt::Column::Status.eq(SeaAttemptStatus::InFlight))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn release_stuck(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = delivery_attempt::Entity::update_many()
            .col_expr(
                delivery_attempt::Column::Status,
                Expr::value(SeaAttemptStatus::Pending),
            )
            .col_expr(
                delivery_attempt::Column::ClaimedAt,
                Expr::value(Option::<sea_orm::prelude::DateTimeWithTimeZone>::None),
            )
            .filter(delivery_attempt::Column::Status.eq(SeaAttemptStatus::InFlight))
            .filter(delivery_attempt::Column::ClaimedAt.lt(cutoff.fixed_offset()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}
