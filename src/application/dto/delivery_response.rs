// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use crate::domain::models::webhook::WebhookEventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 已入队的投递
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAcceptedDto {
    pub attempt_id: Uuid,
    pub delivery_id: Uuid,
    pub webhook_id: Uuid,
    pub event_type: WebhookEventType,
    pub attempt_number: i32,
    pub status: AttemptStatus,
    pub scheduled_at: DateTime<Utc>,
}

impl From<DeliveryAttempt> for DeliveryAcceptedDto {
    fn from(attempt: DeliveryAttempt) -> Self {
        Self {
            attempt_id: attempt.id,
            delivery_id: attempt.delivery_id,
            webhook_id: attempt.subscription_id,
            event_type: attempt.event_type,
            attempt_number: attempt.attempt_number,
            status: attempt.status,
            scheduled_at: attempt.scheduled_at,
        }
    }
}

/// 事件发布结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishEventResponseDto {
    pub event_type: WebhookEventType,
    pub deliveries: Vec<DeliveryAcceptedDto>,
}
