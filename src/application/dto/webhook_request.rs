// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{SubscriptionStatus, Webhook, WebhookEventType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhookRequestDto {
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, message = "eventTypes cannot be empty"))]
    pub event_types: Vec<String>,
    /// 不提供时自动生成
    #[validate(length(min = 16, message = "secret must be at least 16 characters"))]
    pub secret: Option<String>,
    pub created_by_user_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhookRequestDto {
    #[validate(url)]
    pub url: Option<String>,
    #[validate(length(min = 1, message = "eventTypes cannot be empty"))]
    pub event_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetStatusRequestDto {
    pub status: SubscriptionStatus,
}

/// 订阅视图，不包含密钥
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponseDto {
    pub id: Uuid,
    pub team_id: Uuid,
    pub url: String,
    pub event_types: BTreeSet<WebhookEventType>,
    pub status: SubscriptionStatus,
    pub consecutive_failures: i32,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Webhook> for WebhookResponseDto {
    fn from(webhook: Webhook) -> Self {
        Self {
            id: webhook.id,
            team_id: webhook.team_id,
            url: webhook.url,
            event_types: webhook.event_types,
            status: webhook.status,
            consecutive_failures: webhook.consecutive_failures,
            created_by_user_id: webhook.created_by_user_id,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

/// 创建或轮换密钥时返回，只在这两个时刻暴露密钥
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookWithSecretDto {
    #[serde(flatten)]
    pub webhook: WebhookResponseDto,
    pub secret: String,
}

impl From<Webhook> for WebhookWithSecretDto {
    fn from(webhook: Webhook) -> Self {
        let secret = webhook.secret.clone();
        Self {
            webhook: webhook.into(),
            secret,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishEventRequestDto {
    #[validate(length(min = 1, message = "eventType cannot be empty"))]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}
