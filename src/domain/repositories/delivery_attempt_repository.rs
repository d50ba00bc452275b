// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::webhook_repository::RepositoryError;
use crate::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 投递尝试仓库特质
///
/// 定义投递队列的持久化接口
#[async_trait]
pub trait DeliveryAttemptRepository: Send + Sync {
    /// 插入新的投递尝试
    async fn create(&self, attempt: &DeliveryAttempt) -> Result<DeliveryAttempt, RepositoryError>;
    /// 根据ID查找投递尝试
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryAttempt>, RepositoryError>;
    /// 查找同一逻辑投递的全部尝试，按尝试序号升序
    async fn find_by_delivery(
        &self,
        delivery_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, RepositoryError>;
    /// 领取就绪的尝试
    ///
    /// 返回 `scheduled_at <= now` 的 PENDING 尝试，按 `scheduled_at` 升序，
    /// 每条都通过 PENDING→IN_FLIGHT 的条件更新领取，保证同一尝试只会被一个调用者拿到。
    async fn claim_ready(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<DeliveryAttempt>, RepositoryError>;
    /// 将 IN_FLIGHT 尝试关闭为终态；返回是否真正发生了状态变化
    async fn finish(&self, id: Uuid, status: AttemptStatus) -> Result<bool, RepositoryError>;
    /// 将领取时间早于 `cutoff` 的 IN_FLIGHT 尝试放回 PENDING
    async fn release_stuck(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
