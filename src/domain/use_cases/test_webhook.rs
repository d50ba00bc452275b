// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::call_record::CallRecord;
use crate::domain::models::webhook::{EventEnvelope, WebhookEventType};
use crate::domain::services::delivery_executor::DeliveryExecutor;
use crate::domain::services::subscription_registry::SubscriptionRegistry;
use crate::utils::errors::WebhookError;
use tracing::info;
use uuid::Uuid;

/// 手动测试订阅
///
/// 立即发送一个示例事件，单次尝试、不安排重试，
/// 也不影响订阅的连续失败次数。不检查订阅状态。
pub struct TestWebhookUseCase {
    registry: SubscriptionRegistry,
    executor: DeliveryExecutor,
}

impl TestWebhookUseCase {
    pub fn new(registry: SubscriptionRegistry, executor: DeliveryExecutor) -> Self {
        Self { registry, executor }
    }

    pub async fn execute(&self, webhook_id: Uuid, team_id: Uuid) -> Result<CallRecord, WebhookError> {
        let webhook = self.registry.get(webhook_id, team_id).await?;
        let event_type = webhook
            .event_types
            .iter()
            .next()
            .copied()
            .unwrap_or(WebhookEventType::EmailSent);

        let payload = EventEnvelope::sample(event_type).to_value();
        let record = CallRecord::for_test(webhook.id, team_id, event_type, payload);
        let executed = self.executor.execute(&webhook, record).await?;

        info!(
            "Test call {} to webhook {} finished as {}",
            executed.record.id, webhook.id, executed.record.status
        );
        Ok(executed.record)
    }
}
