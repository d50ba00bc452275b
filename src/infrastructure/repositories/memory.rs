// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 进程内仓库实现
//!
//! 用于开发和测试阶段。语义与 SeaORM 实现一致：
//! 计数器与状态的修改都在同一把写锁内完成。

use crate::domain::models::call_record::{CallOutcome, CallRecord, CallStatus};
use crate::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use crate::domain::models::webhook::{SubscriptionStatus, Webhook, WebhookEventType};
use crate::domain::repositories::call_record_repository::{CallQuery, CallRecordRepository};
use crate::domain::repositories::delivery_attempt_repository::DeliveryAttemptRepository;
use crate::domain::repositories::webhook_repository::{
    FailureTally, RepositoryError, WebhookPatch, WebhookRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 内存中的订阅仓库
#[derive(Default, Clone)]
pub struct InMemoryWebhookRepository {
    webhooks: Arc<RwLock<HashMap<Uuid, Webhook>>>,
}

impl InMemoryWebhookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 未删除的订阅，否则 NotFound
fn live_mut(
    webhooks: &mut HashMap<Uuid, Webhook>,
    id: Uuid,
) -> Result<&mut Webhook, RepositoryError> {
    webhooks
        .get_mut(&id)
        .filter(|w| !w.is_deleted())
        .ok_or(RepositoryError::NotFound)
}

#[async_trait]
impl WebhookRepository for InMemoryWebhookRepository {
    async fn create_within_limit(
        &self,
        webhook: &Webhook,
        limit: u64,
    ) -> Result<Webhook, RepositoryError> {
        let mut webhooks = self.webhooks.write();
        let existing = webhooks
            .values()
            .filter(|w| w.team_id == webhook.team_id && !w.is_deleted())
            .count() as u64;
        if existing >= limit {
            return Err(RepositoryError::LimitReached { limit });
        }
        webhooks.insert(webhook.id, webhook.clone());
        Ok(webhook.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
        Ok(self.webhooks.read().get(&id).cloned())
    }

    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Webhook>, RepositoryError> {
        let mut found: Vec<Webhook> = self
            .webhooks
            .read()
            .values()
            .filter(|w| w.team_id == team_id && !w.is_deleted())
            .cloned()
            .collect();
        found.sort_by_key(|w| Reverse((w.created_at, w.id)));
        Ok(found)
    }

    async fn find_active_for_event(
        &self,
        team_id: Uuid,
        event_type: WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        let mut found: Vec<Webhook> = self
            .webhooks
            .read()
            .values()
            .filter(|w| {
                w.team_id == team_id
                    && w.status == SubscriptionStatus::Active
                    && w.subscribes_to(event_type)
            })
            .cloned()
            .collect();
        found.sort_by_key(|w| w.created_at);
        Ok(found)
    }

    async fn update(&self, id: Uuid, patch: &WebhookPatch) -> Result<Webhook, RepositoryError> {
        let mut webhooks = self.webhooks.write();
        let stored = live_mut(&mut webhooks, id)?;
        if let Some(url) = patch.url.as_ref() {
            stored.url = url.clone();
        }
        if let Some(event_types) = patch.event_types.as_ref() {
            stored.event_types = event_types.clone();
        }
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn rotate_secret(&self, id: Uuid, secret: &str) -> Result<Webhook, RepositoryError> {
        let mut webhooks = self.webhooks.write();
        let stored = live_mut(&mut webhooks, id)?;
        stored.secret = secret.to_string();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Webhook, RepositoryError> {
        let mut webhooks = self.webhooks.write();
        let stored = live_mut(&mut webhooks, id)?;
        stored.status = status;
        if status == SubscriptionStatus::Active {
            stored.consecutive_failures = 0;
        }
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn reset_failures(&self, id: Uuid) -> Result<(), RepositoryError> {
        if let Some(stored) = self.webhooks.write().get_mut(&id) {
            stored.consecutive_failures = 0;
        }
        Ok(())
    }

    async fn record_terminal_failure(
        &self,
        id: Uuid,
        threshold: i32,
    ) -> Result<FailureTally, RepositoryError> {
        let mut webhooks = self.webhooks.write();
        let stored = webhooks.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        stored.consecutive_failures += 1;

        let disabled = matches!(
            stored.status,
            SubscriptionStatus::Active | SubscriptionStatus::Paused
        ) && stored.consecutive_failures >= threshold;
        if disabled {
            stored.status = SubscriptionStatus::Disabled;
            stored.updated_at = Utc::now();
        }

        Ok(FailureTally {
            consecutive_failures: stored.consecutive_failures,
            disabled,
        })
    }
}

/// 内存中的投递尝试仓库
#[derive(Default, Clone)]
pub struct InMemoryDeliveryAttemptRepository {
    attempts: Arc<RwLock<HashMap<Uuid, DeliveryAttempt>>>,
}

impl InMemoryDeliveryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前所有尝试的快照
    pub fn snapshot(&self) -> Vec<DeliveryAttempt> {
        self.attempts.read().values().cloned().collect()
    }
}

#[async_trait]
impl DeliveryAttemptRepository for InMemoryDeliveryAttemptRepository {
    async fn create(&self, attempt: &DeliveryAttempt) -> Result<DeliveryAttempt, RepositoryError> {
        self.attempts.write().insert(attempt.id, attempt.clone());
        Ok(attempt.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryAttempt>, RepositoryError> {
        Ok(self.attempts.read().get(&id).cloned())
    }

    async fn find_by_delivery(
        &self,
        delivery_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, RepositoryError> {
        let mut found: Vec<DeliveryAttempt> = self
            .attempts
            .read()
            .values()
            .filter(|a| a.delivery_id == delivery_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.attempt_number);
        Ok(found)
    }

    async fn claim_ready(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<DeliveryAttempt>, RepositoryError> {
        let mut attempts = self.attempts.write();
        let mut ready: Vec<&mut DeliveryAttempt> = attempts
            .values_mut()
            .filter(|a| a.status == AttemptStatus::Pending && a.scheduled_at <= now)
            .collect();
        ready.sort_by_key(|a| (a.scheduled_at, a.created_at));

        Ok(ready
            .into_iter()
            .take(limit as usize)
            .map(|attempt| {
                attempt.status = AttemptStatus::InFlight;
                attempt.claimed_at = Some(now);
                attempt.clone()
            })
            .collect())
    }

    async fn finish(&self, id: Uuid, status: AttemptStatus) -> Result<bool, RepositoryError> {
        let mut attempts = self.attempts.write();
        match attempts.get_mut(&id) {
            Some(attempt) if attempt.status == AttemptStatus::InFlight => {
                attempt.status = status;
                attempt.completed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stuck(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut released = 0;
        for attempt in self.attempts.write().values_mut() {
            let stuck = attempt.status == AttemptStatus::InFlight
                && attempt.claimed_at.is_some_and(|claimed| claimed < cutoff);
            if stuck {
                attempt.status = AttemptStatus::Pending;
                attempt.claimed_at = None;
                released += 1;
            }
        }
        Ok(released)
    }
}

/// 内存中的调用记录仓库
#[derive(Default, Clone)]
pub struct InMemoryCallRecordRepository {
    records: Arc<RwLock<Vec<CallRecord>>>,
}

impl InMemoryCallRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallRecordRepository for InMemoryCallRecordRepository {
    async fn append(&self, record: &CallRecord) -> Result<CallRecord, RepositoryError> {
        self.records.write().push(record.clone());
        Ok(record.clone())
    }

    async fn close(&self, id: Uuid, outcome: &CallOutcome) -> Result<CallRecord, RepositoryError> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.status == CallStatus::Pending)
            .ok_or(RepositoryError::NotFound)?;
        record.status = outcome.status;
        record.response_status = outcome.response_status;
        record.response_body = outcome.response_body.clone();
        record.error_message = outcome.error_message.clone();
        record.duration_ms = outcome.duration_ms;
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, RepositoryError> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, query: &CallQuery) -> Result<Vec<CallRecord>, RepositoryError> {
        let records = self.records.read();

        let cursor = match query.cursor {
            Some(cursor_id) => Some(
                records
                    .iter()
                    .find(|r| r.id == cursor_id && r.team_id == query.team_id)
                    .map(|r| (r.created_at, r.id))
                    .ok_or(RepositoryError::NotFound)?,
            ),
            None => None,
        };

        let mut found: Vec<CallRecord> = records
            .iter()
            .filter(|r| r.team_id == query.team_id)
            .filter(|r| query.webhook_id.map_or(true, |id| r.webhook_id == id))
            .filter(|r| query.status.map_or(true, |status| r.status == status))
            .filter(|r| cursor.map_or(true, |position| (r.created_at, r.id) <= position))
            .cloned()
            .collect();
        found.sort_by_key(|r| Reverse((r.created_at, r.id)));
        found.truncate(query.limit as usize);
        Ok(found)
    }

    async fn find_by_delivery(&self, delivery_id: Uuid) -> Result<Vec<CallRecord>, RepositoryError> {
        let mut found: Vec<CallRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.delivery_id == Some(delivery_id))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.attempt_number, r.created_at));
        Ok(found)
    }
}
