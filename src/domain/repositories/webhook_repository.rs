// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{SubscriptionStatus, Webhook, WebhookEventType};
use async_trait::async_trait;
use sea_orm::DbErr;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 团队未删除订阅数已达上限
    #[error("Subscription limit of {limit} reached")]
    LimitReached { limit: u64 },
    /// 存储内容无法映射为领域模型
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// 一次终态失败登记后的订阅计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTally {
    /// 递增后的连续失败次数
    pub consecutive_failures: i32,
    /// 本次调用是否将订阅切换为 DISABLED
    pub disabled: bool,
}

/// Webhook订阅仓库特质
///
/// 计数器与状态字段会被多个分发工作器并发修改，
/// 因此相关方法必须以原子递增或条件更新实现，不能先读后写。
/// 订阅的部分更新，`None` 字段保持原值
#[derive(Debug, Clone, Default)]
pub struct WebhookPatch {
    pub url: Option<String>,
    pub event_types: Option<BTreeSet<WebhookEventType>>,
}

#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// 在团队未删除订阅数小于 `limit` 时创建订阅
    async fn create_within_limit(
        &self,
        webhook: &Webhook,
        limit: u64,
    ) -> Result<Webhook, RepositoryError>;
    /// 根据ID查找订阅（包括已删除的）
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError>;
    /// 列出团队所有未删除的订阅，按创建时间倒序
    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Webhook>, RepositoryError>;
    /// 查找团队下订阅了该事件且处于 ACTIVE 的订阅
    async fn find_active_for_event(
        &self,
        team_id: Uuid,
        event_type: WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError>;
    /// 只写入补丁中给出的字段；已删除订阅返回 NotFound
    async fn update(&self, id: Uuid, patch: &WebhookPatch) -> Result<Webhook, RepositoryError>;
    /// 只替换签名密钥；已删除订阅返回 NotFound
    async fn rotate_secret(&self, id: Uuid, secret: &str) -> Result<Webhook, RepositoryError>;
    /// 以条件更新设置状态，已删除订阅返回 NotFound；
    /// 设置为 ACTIVE 时同时将连续失败次数清零
    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Webhook, RepositoryError>;
    /// 将连续失败次数原子清零
    async fn reset_failures(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 原子递增连续失败次数，并在达到阈值时以条件更新切换为 DISABLED
    async fn record_terminal_failure(
        &self,
        id: Uuid,
        threshold: i32,
    ) -> Result<FailureTally, RepositoryError>;
}
