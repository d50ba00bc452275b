// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::signer;
use crate::application::dto::webhook_request::{CreateWebhookRequestDto, UpdateWebhookRequestDto};
use crate::config::settings::PlanSettings;
use crate::domain::models::webhook::{PlanTier, SubscriptionStatus, Webhook, WebhookEventType};
use crate::domain::repositories::webhook_repository::{
    FailureTally, RepositoryError, WebhookPatch, WebhookRepository,
};
use crate::utils::errors::WebhookError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;
use validator::Validate;

/// 订阅注册表
///
/// 事件生产者通过 `resolve` 找到应接收事件的订阅；
/// 管理操作在套餐配额和团队归属约束下修改订阅。
#[derive(Clone)]
pub struct SubscriptionRegistry {
    repo: Arc<dyn WebhookRepository>,
    plans: PlanSettings,
}

impl SubscriptionRegistry {
    pub fn new(repo: Arc<dyn WebhookRepository>, plans: PlanSettings) -> Self {
        Self { repo, plans }
    }

    /// 解析团队下订阅了该事件且处于 ACTIVE 的订阅
    pub async fn resolve(
        &self,
        team_id: Uuid,
        event_type: WebhookEventType,
    ) -> Result<Vec<Webhook>, WebhookError> {
        let webhooks = self.repo.find_active_for_event(team_id, event_type).await?;
        Ok(webhooks
            .into_iter()
            .filter(|w| w.team_id == team_id && w.accepts_events() && w.subscribes_to(event_type))
            .collect())
    }

    /// 创建订阅
    ///
    /// 超过套餐配额时返回 `QuotaExceeded`
    pub async fn create(
        &self,
        team_id: Uuid,
        plan: PlanTier,
        dto: CreateWebhookRequestDto,
    ) -> Result<Webhook, WebhookError> {
        dto.validate()
            .map_err(|e| WebhookError::Validation(e.to_string()))?;
        let url = parse_endpoint(&dto.url)?;
        let event_types = parse_event_types(&dto.event_types)?;
        let secret = dto.secret.unwrap_or_else(signer::generate_secret);

        let webhook = Webhook::new(team_id, url, secret, event_types, dto.created_by_user_id);
        let limit = self.plans.limit_for(plan);
        let created = self.repo.create_within_limit(&webhook, limit).await?;

        info!(
            "Webhook {} created for team {} ({} event types)",
            created.id,
            team_id,
            created.event_types.len()
        );
        Ok(created)
    }

    /// 获取团队拥有的未删除订阅
    pub async fn get(&self, id: Uuid, team_id: Uuid) -> Result<Webhook, WebhookError> {
        match self.repo.find_by_id(id).await? {
            Some(webhook) if webhook.team_id == team_id && !webhook.is_deleted() => Ok(webhook),
            _ => Err(WebhookError::NotFound("Webhook")),
        }
    }

    /// 列出团队所有未删除的订阅
    pub async fn list(&self, team_id: Uuid) -> Result<Vec<Webhook>, WebhookError> {
        Ok(self.repo.find_by_team(team_id).await?)
    }

    /// 更新 URL 或事件类型
    pub async fn update(
        &self,
        id: Uuid,
        team_id: Uuid,
        dto: UpdateWebhookRequestDto,
    ) -> Result<Webhook, WebhookError> {
        dto.validate()
            .map_err(|e| WebhookError::Validation(e.to_string()))?;

        let patch = WebhookPatch {
            url: dto.url.as_deref().map(parse_endpoint).transpose()?,
            event_types: dto
                .event_types
                .as_deref()
                .map(parse_event_types)
                .transpose()?,
        };

        self.get(id, team_id).await?;
        self.repo.update(id, &patch).await.map_err(webhook_error)
    }

    /// 设置订阅状态
    ///
    /// 不允许通过此路径设置 DELETED；设置为 ACTIVE 会清零连续失败次数。
    /// 写入以"未删除"为条件，期间被删除的订阅返回 NotFound
    pub async fn set_status(
        &self,
        id: Uuid,
        team_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Webhook, WebhookError> {
        let current = self.get(id, team_id).await?;
        if status == SubscriptionStatus::Deleted {
            return Err(WebhookError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self
            .repo
            .set_status(id, status)
            .await
            .map_err(webhook_error)?;
        info!(
            "Webhook {} status changed from {} to {}",
            id, current.status, updated.status
        );
        Ok(updated)
    }

    /// 软删除订阅
    pub async fn delete(&self, id: Uuid, team_id: Uuid) -> Result<(), WebhookError> {
        self.get(id, team_id).await?;
        self.repo
            .set_status(id, SubscriptionStatus::Deleted)
            .await
            .map_err(webhook_error)?;
        info!("Webhook {} deleted", id);
        Ok(())
    }

    /// 轮换签名密钥
    pub async fn rotate_secret(&self, id: Uuid, team_id: Uuid) -> Result<Webhook, WebhookError> {
        self.get(id, team_id).await?;
        let updated = self
            .repo
            .rotate_secret(id, &signer::generate_secret())
            .await
            .map_err(webhook_error)?;
        info!("Webhook {} secret rotated", id);
        Ok(updated)
    }

    /// 投递成功：清零连续失败次数
    pub async fn record_success(&self, id: Uuid) -> Result<(), WebhookError> {
        Ok(self.repo.reset_failures(id).await?)
    }

    /// 终态失败：递增计数，达到阈值时熔断
    pub async fn record_terminal_failure(
        &self,
        id: Uuid,
        threshold: i32,
    ) -> Result<FailureTally, WebhookError> {
        let tally = self.repo.record_terminal_failure(id, threshold).await?;
        if tally.disabled {
            warn!(
                "Webhook {} disabled after {} consecutive failures",
                id, tally.consecutive_failures
            );
        }
        Ok(tally)
    }
}

fn webhook_error(err: RepositoryError) -> WebhookError {
    match err {
        RepositoryError::NotFound => WebhookError::NotFound("Webhook"),
        other => other.into(),
    }
}

fn parse_endpoint(raw: &str) -> Result<String, WebhookError> {
    let url = Url::parse(raw).map_err(|e| WebhookError::Validation(format!("invalid url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(WebhookError::Validation(format!(
            "unsupported url scheme: {other}"
        ))),
    }
}

fn parse_event_types(raw: &[String]) -> Result<BTreeSet<WebhookEventType>, WebhookError> {
    let event_types = raw
        .iter()
        .map(|tag| tag.parse::<WebhookEventType>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    if event_types.is_empty() {
        return Err(WebhookError::Validation(
            "eventTypes cannot be empty".to_string(),
        ));
    }
    Ok(event_types)
}
