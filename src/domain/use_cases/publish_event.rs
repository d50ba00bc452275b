// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::webhook_request::PublishEventRequestDto;
use crate::domain::models::delivery::DeliveryAttempt;
use crate::domain::models::webhook::{EventEnvelope, WebhookEventType};
use crate::domain::services::subscription_registry::SubscriptionRegistry;
use crate::queue::delivery_queue::DeliveryQueue;
use crate::utils::errors::WebhookError;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// 发布领域事件
///
/// 解析匹配的订阅，为每个订阅入队一个首次尝试
pub struct PublishEventUseCase {
    registry: SubscriptionRegistry,
    queue: Arc<dyn DeliveryQueue>,
}

impl PublishEventUseCase {
    pub fn new(registry: SubscriptionRegistry, queue: Arc<dyn DeliveryQueue>) -> Self {
        Self { registry, queue }
    }

    /// 校验请求并发布，返回解析出的事件类型与入队的尝试
    pub async fn execute(
        &self,
        team_id: Uuid,
        dto: PublishEventRequestDto,
    ) -> Result<(WebhookEventType, Vec<DeliveryAttempt>), WebhookError> {
        dto.validate()
            .map_err(|e| WebhookError::Validation(e.to_string()))?;
        let event_type: WebhookEventType = dto.event_type.parse()?;
        let attempts = self.publish(team_id, event_type, dto.data).await?;
        Ok((event_type, attempts))
    }

    /// 以已校验的事件类型发布
    pub async fn publish(
        &self,
        team_id: Uuid,
        event_type: WebhookEventType,
        data: serde_json::Value,
    ) -> Result<Vec<DeliveryAttempt>, WebhookError> {
        let subscriptions = self.registry.resolve(team_id, event_type).await?;
        if subscriptions.is_empty() {
            debug!("No active webhooks for {} in team {}", event_type, team_id);
            return Ok(Vec::new());
        }

        // One snapshot shared by every subscription
        let payload = EventEnvelope::new(event_type, data).to_value();

        let mut attempts = Vec::with_capacity(subscriptions.len());
        for webhook in subscriptions {
            let attempt = self
                .queue
                .enqueue(webhook.id, team_id, event_type, payload.clone())
                .await?;
            attempts.push(attempt);
        }

        info!(
            "Event {} for team {} enqueued to {} webhook(s)",
            event_type,
            team_id,
            attempts.len()
        );
        Ok(attempts)
    }
}
