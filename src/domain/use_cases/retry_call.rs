// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::DeliveryAttempt;
use crate::domain::services::call_ledger::CallLedger;
use crate::domain::services::subscription_registry::SubscriptionRegistry;
use crate::queue::delivery_queue::DeliveryQueue;
use crate::utils::errors::WebhookError;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 手动重试一条调用记录
///
/// 用原始负载重新入队一个新的逻辑投递，尝试序号从1开始
pub struct RetryCallUseCase {
    ledger: CallLedger,
    registry: SubscriptionRegistry,
    queue: Arc<dyn DeliveryQueue>,
}

impl RetryCallUseCase {
    pub fn new(
        ledger: CallLedger,
        registry: SubscriptionRegistry,
        queue: Arc<dyn DeliveryQueue>,
    ) -> Self {
        Self {
            ledger,
            registry,
            queue,
        }
    }

    pub async fn execute(&self, call_id: Uuid, team_id: Uuid) -> Result<DeliveryAttempt, WebhookError> {
        let call = self.ledger.get(call_id, team_id).await?;
        let webhook = self.registry.get(call.webhook_id, team_id).await?;

        let attempt = self
            .queue
            .enqueue(webhook.id, team_id, call.event_type, call.request_payload)
            .await?;

        info!(
            "Call {} re-enqueued as delivery {} for webhook {}",
            call_id, attempt.delivery_id, webhook.id
        );
        Ok(attempt)
    }
}
