// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::webhook_request::{
    CreateWebhookRequestDto, SetStatusRequestDto, UpdateWebhookRequestDto, WebhookResponseDto,
    WebhookWithSecretDto,
};
use crate::domain::models::call_record::CallRecord;
use crate::domain::services::subscription_registry::SubscriptionRegistry;
use crate::domain::use_cases::test_webhook::TestWebhookUseCase;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::team_id::{TeamId, TeamPlan};
use axum::{extract::Path, http::StatusCode, Extension, Json};
use std::sync::Arc;
use uuid::Uuid;

/// 创建订阅，响应中包含密钥
pub async fn create_webhook(
    TeamId(team_id): TeamId,
    TeamPlan(plan): TeamPlan,
    Extension(registry): Extension<SubscriptionRegistry>,
    Json(payload): Json<CreateWebhookRequestDto>,
) -> Result<(StatusCode, Json<WebhookWithSecretDto>), AppError> {
    let webhook = registry.create(team_id, plan, payload).await?;
    Ok((StatusCode::CREATED, Json(webhook.into())))
}

/// 列出团队的订阅
pub async fn list_webhooks(
    TeamId(team_id): TeamId,
    Extension(registry): Extension<SubscriptionRegistry>,
) -> Result<Json<Vec<WebhookResponseDto>>, AppError> {
    let webhooks = registry.list(team_id).await?;
    Ok(Json(webhooks.into_iter().map(Into::into).collect()))
}

pub async fn get_webhook(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(registry): Extension<SubscriptionRegistry>,
) -> Result<Json<WebhookResponseDto>, AppError> {
    let webhook = registry.get(id, team_id).await?;
    Ok(Json(webhook.into()))
}

pub async fn update_webhook(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(registry): Extension<SubscriptionRegistry>,
    Json(payload): Json<UpdateWebhookRequestDto>,
) -> Result<Json<WebhookResponseDto>, AppError> {
    let webhook = registry.update(id, team_id, payload).await?;
    Ok(Json(webhook.into()))
}

pub async fn set_webhook_status(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(registry): Extension<SubscriptionRegistry>,
    Json(payload): Json<SetStatusRequestDto>,
) -> Result<Json<WebhookResponseDto>, AppError> {
    let webhook = registry.set_status(id, team_id, payload.status).await?;
    Ok(Json(webhook.into()))
}

/// 软删除订阅
pub async fn delete_webhook(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(registry): Extension<SubscriptionRegistry>,
) -> Result<StatusCode, AppError> {
    registry.delete(id, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 轮换密钥，响应中包含新密钥
pub async fn rotate_secret(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(registry): Extension<SubscriptionRegistry>,
) -> Result<Json<WebhookWithSecretDto>, AppError> {
    let webhook = registry.rotate_secret(id, team_id).await?;
    Ok(Json(webhook.into()))
}

/// 立即发送一个示例事件
pub async fn test_webhook(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(use_case): Extension<Arc<TestWebhookUseCase>>,
) -> Result<Json<CallRecord>, AppError> {
    let record = use_case.execute(id, team_id).await?;
    Ok(Json(record))
}
