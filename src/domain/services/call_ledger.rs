// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::call_query_request::CallQueryRequestDto;
use crate::domain::models::call_record::{CallOutcome, CallPage, CallRecord, CallStatus};
use crate::domain::repositories::call_record_repository::{CallQuery, CallRecordRepository};
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::utils::errors::WebhookError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// 每页条数上限
pub const MAX_PAGE_SIZE: u64 = 50;

/// 调用账本
///
/// 每次投递执行的只追加审计记录，供重试决策与排障查询使用
#[derive(Clone)]
pub struct CallLedger {
    repo: Arc<dyn CallRecordRepository>,
}

impl CallLedger {
    pub fn new(repo: Arc<dyn CallRecordRepository>) -> Self {
        Self { repo }
    }

    /// 在发送前打开一条 PENDING 记录
    pub async fn open(&self, record: CallRecord) -> Result<CallRecord, RepositoryError> {
        self.repo.append(&record).await
    }

    /// 以最终结果关闭记录
    pub async fn close(
        &self,
        id: Uuid,
        outcome: &CallOutcome,
    ) -> Result<CallRecord, RepositoryError> {
        debug_assert!(outcome.status != CallStatus::Pending);
        self.repo.close(id, outcome).await
    }

    /// 获取团队的一条调用记录
    pub async fn get(&self, id: Uuid, team_id: Uuid) -> Result<CallRecord, WebhookError> {
        match self.repo.find_by_id(id).await? {
            Some(record) if record.team_id == team_id => Ok(record),
            _ => Err(WebhookError::NotFound("Webhook call")),
        }
    }

    /// 按 `created_at` 倒序分页列出调用记录
    ///
    /// `next_cursor` 是本页之后第一条记录的ID，作为下一页的起点（包含）
    pub async fn list(
        &self,
        team_id: Uuid,
        dto: CallQueryRequestDto,
    ) -> Result<CallPage, WebhookError> {
        dto.validate()
            .map_err(|e| WebhookError::Validation(e.to_string()))?;

        let status = dto
            .status
            .as_deref()
            .map(|s| {
                s.parse::<CallStatus>()
                    .map_err(|_| WebhookError::Validation(format!("unknown call status: {s}")))
            })
            .transpose()?;
        let limit = dto.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

        let query = CallQuery {
            team_id,
            webhook_id: dto.webhook_id,
            status,
            cursor: dto.cursor,
            limit: limit + 1,
        };

        let mut items = match self.repo.list(&query).await {
            Ok(items) => items,
            Err(RepositoryError::NotFound) => {
                return Err(WebhookError::Validation("invalid cursor".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let next_cursor = if items.len() as u64 > limit {
            items.truncate(limit as usize + 1);
            items.pop().map(|extra| extra.id)
        } else {
            None
        };

        Ok(CallPage { items, next_cursor })
    }

    /// 同一逻辑投递的全部调用记录
    pub async fn history(&self, delivery_id: Uuid) -> Result<Vec<CallRecord>, WebhookError> {
        Ok(self.repo.find_by_delivery(delivery_id).await?)
    }
}
