// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use crate::domain::models::webhook::WebhookEventType;
use crate::domain::repositories::delivery_attempt_repository::DeliveryAttemptRepository;
use crate::domain::repositories::webhook_repository::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 重试预算已用尽
    #[error("Retry budget exhausted for delivery {0}")]
    Exhausted(Uuid),

    /// 尝试不处于可关闭的状态
    #[error("Attempt {0} is not in flight")]
    NotInFlight(Uuid),
}

/// 投递队列特质
///
/// 将事件生产与HTTP投递解耦
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// 为订阅创建首次尝试（attempt_number = 1，立即就绪）
    async fn enqueue(
        &self,
        subscription_id: Uuid,
        team_id: Uuid,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<DeliveryAttempt, QueueError>;

    /// 创建第 N+1 次尝试，在 `now + delay` 就绪，负载不变
    async fn enqueue_retry(
        &self,
        attempt: &DeliveryAttempt,
        delay: Duration,
    ) -> Result<DeliveryAttempt, QueueError>;

    /// 领取最多 `limit` 条就绪尝试，按计划时间升序
    async fn dequeue_ready(&self, limit: u64) -> Result<Vec<DeliveryAttempt>, QueueError>;

    /// 以终态关闭已领取的尝试
    async fn complete(&self, attempt_id: Uuid, status: AttemptStatus) -> Result<(), QueueError>;

    /// 将卡住的 IN_FLIGHT 尝试放回队列
    async fn release_stuck(&self, older_than: Duration) -> Result<u64, QueueError>;
}

/// 基于仓库的投递队列实现
pub struct RepositoryDeliveryQueue {
    /// 投递尝试仓库
    repository: Arc<dyn DeliveryAttemptRepository>,
    /// 新逻辑投递的最大尝试次数
    max_attempts: i32,
}

impl RepositoryDeliveryQueue {
    /// 创建新的投递队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 投递尝试仓库
    /// * `max_attempts` - 每个逻辑投递的最大尝试次数
    pub fn new(repository: Arc<dyn DeliveryAttemptRepository>, max_attempts: u32) -> Self {
        Self {
            repository,
            max_attempts: max_attempts.max(1) as i32,
        }
    }
}

#[async_trait]
impl DeliveryQueue for RepositoryDeliveryQueue {
    async fn enqueue(
        &self,
        subscription_id: Uuid,
        team_id: Uuid,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<DeliveryAttempt, QueueError> {
        let attempt = DeliveryAttempt::first(
            subscription_id,
            team_id,
            event_type,
            payload,
            self.max_attempts,
        );
        Ok(self.repository.create(&attempt).await?)
    }

    async fn enqueue_retry(
        &self,
        attempt: &DeliveryAttempt,
        delay: Duration,
    ) -> Result<DeliveryAttempt, QueueError> {
        if attempt.is_last() {
            return Err(QueueError::Exhausted(attempt.delivery_id));
        }
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let scheduled_at = Utc::now()
            .checked_add_signed(delay)
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
        let retry = attempt.next(scheduled_at.max(attempt.scheduled_at));
        Ok(self.repository.create(&retry).await?)
    }

    async fn dequeue_ready(&self, limit: u64) -> Result<Vec<DeliveryAttempt>, QueueError> {
        Ok(self.repository.claim_ready(Utc::now(), limit).await?)
    }

    async fn complete(&self, attempt_id: Uuid, status: AttemptStatus) -> Result<(), QueueError> {
        debug_assert!(status.is_terminal());
        if self.repository.finish(attempt_id, status).await? {
            Ok(())
        } else {
            Err(QueueError::NotInFlight(attempt_id))
        }
    }

    async fn release_stuck(&self, older_than: Duration) -> Result<u64, QueueError> {
        let older_than = chrono::Duration::from_std(older_than).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(older_than)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
        Ok(self.repository.release_stuck(cutoff).await?)
    }
}
