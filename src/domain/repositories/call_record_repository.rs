// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::webhook_repository::RepositoryError;
use crate::domain::models::call_record::{CallOutcome, CallRecord, CallStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// 调用记录查询参数
#[derive(Debug, Clone, Default)]
pub struct CallQuery {
    pub team_id: Uuid,
    pub webhook_id: Option<Uuid>,
    pub status: Option<CallStatus>,
    /// 起始记录ID（包含）
    pub cursor: Option<Uuid>,
    pub limit: u64,
}

/// 调用记录仓库特质
///
/// 只追加：记录创建后只允许一次从 PENDING 到终态的关闭
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// 追加一条记录
    async fn append(&self, record: &CallRecord) -> Result<CallRecord, RepositoryError>;
    /// 关闭一条 PENDING 记录；已关闭的记录返回 NotFound
    async fn close(&self, id: Uuid, outcome: &CallOutcome) -> Result<CallRecord, RepositoryError>;
    /// 根据ID查找记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, RepositoryError>;
    /// 按 `created_at` 倒序列出记录，最多返回 `limit` 条
    ///
    /// 游标无效（不存在或不属于该团队）时返回 NotFound
    async fn list(&self, query: &CallQuery) -> Result<Vec<CallRecord>, RepositoryError>;
    /// 同一逻辑投递的全部记录，按尝试序号升序
    async fn find_by_delivery(&self, delivery_id: Uuid) -> Result<Vec<CallRecord>, RepositoryError>;
}
