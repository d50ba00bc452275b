// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_request, start_receiver, unreachable_url, TestApp};
use async_trait::async_trait;
use axum::http::StatusCode;
use hookrelay::application::dto::call_query_request::CallQueryRequestDto;
use hookrelay::domain::models::call_record::CallStatus;
use hookrelay::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use hookrelay::domain::models::webhook::{
    PlanTier, SubscriptionStatus, Webhook, WebhookEventType,
};
use hookrelay::domain::repositories::webhook_repository::{
    FailureTally, RepositoryError, WebhookPatch, WebhookRepository,
};
use hookrelay::domain::services::signer;
use hookrelay::domain::services::subscription_registry::SubscriptionRegistry;
use hookrelay::infrastructure::repositories::memory::InMemoryWebhookRepository;
use hookrelay::queue::delivery_queue::{DeliveryQueue, QueueError};
use hookrelay::utils::retry_policy::RetryPolicy;
use hookrelay::workers::expiration_worker::ClaimExpirationWorker;
use hookrelay::workers::manager::DispatcherPool;
use hookrelay::workers::webhook_worker::Dispatcher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_successful_delivery_is_signed_and_recorded() {
    let receiver = start_receiver(StatusCode::OK).await;
    let app = TestApp::new();
    let team_id = Uuid::new_v4();
    let webhook = app
        .create_webhook(team_id, &receiver.url, &["email.sent"])
        .await;

    let attempts = app
        .services
        .publish_event
        .publish(
            team_id,
            WebhookEventType::EmailSent,
            serde_json::json!({ "emailId": "e-1" }),
        )
        .await
        .unwrap();
    assert_eq!(app.drain().await, 1);

    assert_eq!(receiver.hits(), 1);
    let request = &receiver.requests()[0];
    let signature = request.headers[signer::SIGNATURE_HEADER].to_str().unwrap();
    let timestamp: i64 = request.headers[signer::TIMESTAMP_HEADER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(signer::verify(&webhook.secret, &request.body, timestamp, signature));
    assert_eq!(request.headers[signer::EVENT_HEADER], "email.sent");

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body, attempts[0].payload);

    let attempt = app
        .attempts
        .snapshot()
        .into_iter()
        .find(|a| a.id == attempts[0].id)
        .unwrap();
    assert_eq!(attempt.status, AttemptStatus::Success);
    assert!(attempt.completed_at.is_some());

    let history = app
        .services
        .ledger
        .history(attempt.delivery_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, CallStatus::Success);
    assert_eq!(history[0].response_status, Some(200));
    assert_eq!(history[0].attempt_id, Some(attempt.id));
    assert_eq!(
        request.headers[signer::CALL_ID_HEADER],
        history[0].id.to_string().as_str()
    );
}

#[tokio::test]
async fn test_exhausted_delivery_counts_one_failure() {
    let receiver = start_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::new();
    let team_id = Uuid::new_v4();
    let webhook = app
        .create_webhook(team_id, &receiver.url, &["email.sent"])
        .await;

    let attempts = app
        .services
        .publish_event
        .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
        .await
        .unwrap();
    let delivery_id = attempts[0].delivery_id;
    app.drain().await;

    assert_eq!(receiver.hits(), 5);

    let mut chain: Vec<_> = app
        .attempts
        .snapshot()
        .into_iter()
        .filter(|a| a.delivery_id == delivery_id)
        .collect();
    chain.sort_by_key(|a| a.attempt_number);
    assert_eq!(
        chain.iter().map(|a| a.attempt_number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
    assert!(chain[..4].iter().all(|a| a.status == AttemptStatus::Failed));
    assert_eq!(chain[4].status, AttemptStatus::Exhausted);
    assert!(chain.windows(2).all(|w| w[0].scheduled_at <= w[1].scheduled_at));
    assert!(chain.iter().all(|a| a.payload == attempts[0].payload));

    let history = app.services.ledger.history(delivery_id).await.unwrap();
    assert_eq!(history.len(), 5);
    assert!(history.iter().all(|r| r.status == CallStatus::Failed));
    assert!(history.iter().all(|r| r.response_status == Some(500)));
    assert_eq!(
        history.iter().map(|r| r.attempt_number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );

    let webhook = app
        .services
        .registry
        .get(webhook.id, team_id)
        .await
        .unwrap();
    assert_eq!(webhook.consecutive_failures, 1);
    assert_eq!(webhook.status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_success_after_failures_resets_counter() {
    let receiver = start_receiver(StatusCode::SERVICE_UNAVAILABLE).await;
    let app = TestApp::with_policy(1, 10);
    let team_id = Uuid::new_v4();
    let webhook = app
        .create_webhook(team_id, &receiver.url, &["email.sent"])
        .await;
    let publish = &app.services.publish_event;

    for _ in 0..3 {
        publish
            .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
            .await
            .unwrap();
    }
    app.drain().await;
    let registry = &app.services.registry;
    assert_eq!(
        registry.get(webhook.id, team_id).await.unwrap().consecutive_failures,
        3
    );

    receiver.respond_with(StatusCode::NO_CONTENT);
    publish
        .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
        .await
        .unwrap();
    app.drain().await;

    assert_eq!(
        registry.get(webhook.id, team_id).await.unwrap().consecutive_failures,
        0
    );
}

#[tokio::test]
async fn test_breaker_disables_subscription_at_threshold() {
    let receiver = start_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::with_policy(1, 10);
    let team_id = Uuid::new_v4();
    let webhook = app
        .create_webhook(team_id, &receiver.url, &["email.sent"])
        .await;
    let publish = &app.services.publish_event;

    for _ in 0..10 {
        let attempts = publish
            .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(attempts.len(), 1);
        app.drain().await;
    }

    let disabled = app
        .services
        .registry
        .get(webhook.id, team_id)
        .await
        .unwrap();
    assert_eq!(disabled.status, SubscriptionStatus::Disabled);
    assert_eq!(disabled.consecutive_failures, 10);

    let resolved = app
        .services
        .registry
        .resolve(team_id, WebhookEventType::EmailSent)
        .await
        .unwrap();
    assert!(resolved.is_empty());

    let attempts = publish
        .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
        .await
        .unwrap();
    assert!(attempts.is_empty());
    assert_eq!(receiver.hits(), 10);
}

#[tokio::test]
async fn test_network_failure_is_recorded_without_status() {
    let url = unreachable_url().await;
    let app = TestApp::with_policy(1, 10);
    let team_id = Uuid::new_v4();
    app.create_webhook(team_id, &url, &["email.bounced"]).await;

    let attempts = app
        .services
        .publish_event
        .publish(team_id, WebhookEventType::EmailBounced, serde_json::json!({}))
        .await
        .unwrap();
    app.drain().await;

    let history = app
        .services
        .ledger
        .history(attempts[0].delivery_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, CallStatus::Failed);
    assert_eq!(history[0].response_status, None);
    assert!(history[0].error_message.is_some());
}

#[tokio::test]
async fn test_attempt_for_deleted_webhook_is_dropped() {
    let receiver = start_receiver(StatusCode::OK).await;
    let app = TestApp::new();
    let team_id = Uuid::new_v4();
    let webhook = app
        .create_webhook(team_id, &receiver.url, &["email.sent"])
        .await;

    let attempts = app
        .services
        .publish_event
        .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
        .await
        .unwrap();
    app.services
        .registry
        .delete(webhook.id, team_id)
        .await
        .unwrap();
    app.drain().await;

    assert_eq!(receiver.hits(), 0);
    let attempt = app
        .attempts
        .snapshot()
        .into_iter()
        .find(|a| a.id == attempts[0].id)
        .unwrap();
    assert_eq!(attempt.status, AttemptStatus::Failed);

    let page = app
        .services
        .ledger
        .list(team_id, CallQueryRequestDto::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_dispatcher_pool_delivers_and_shuts_down() {
    let receiver = start_receiver(StatusCode::OK).await;
    let app = TestApp::new();
    let team_id = Uuid::new_v4();
    app.create_webhook(team_id, &receiver.url, &["email.clicked"])
        .await;

    let mut pool = DispatcherPool::new(app.dispatcher());
    pool.start_workers(2);
    assert_eq!(pool.size(), 2);

    for _ in 0..5 {
        app.services
            .publish_event
            .publish(team_id, WebhookEventType::EmailClicked, serde_json::json!({}))
            .await
            .unwrap();
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while receiver.hits() < 5 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    pool.shutdown(Duration::from_secs(2)).await;

    assert_eq!(receiver.hits(), 5);
    assert!(app
        .attempts
        .snapshot()
        .iter()
        .all(|a| a.status == AttemptStatus::Success));
}

/// 重试入队总是失败的队列
struct RetryRejectingQueue {
    inner: Arc<dyn DeliveryQueue>,
}

#[async_trait]
impl DeliveryQueue for RetryRejectingQueue {
    async fn enqueue(
        &self,
        subscription_id: Uuid,
        team_id: Uuid,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<DeliveryAttempt, QueueError> {
        self.inner
            .enqueue(subscription_id, team_id, event_type, payload)
            .await
    }

    async fn enqueue_retry(
        &self,
        _attempt: &DeliveryAttempt,
        _delay: Duration,
    ) -> Result<DeliveryAttempt, QueueError> {
        Err(QueueError::Repository(RepositoryError::Corrupt(
            "retry storage unavailable".to_string(),
        )))
    }

    async fn dequeue_ready(&self, limit: u64) -> Result<Vec<DeliveryAttempt>, QueueError> {
        self.inner.dequeue_ready(limit).await
    }

    async fn complete(&self, attempt_id: Uuid, status: AttemptStatus) -> Result<(), QueueError> {
        self.inner.complete(attempt_id, status).await
    }

    async fn release_stuck(&self, older_than: Duration) -> Result<u64, QueueError> {
        self.inner.release_stuck(older_than).await
    }
}

#[tokio::test]
async fn test_failed_retry_enqueue_leaves_attempt_for_reaper() {
    let receiver = start_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::with_policy(3, 10);
    let team_id = Uuid::new_v4();
    let webhook = app
        .create_webhook(team_id, &receiver.url, &["email.sent"])
        .await;
    app.services
        .publish_event
        .publish(team_id, WebhookEventType::EmailSent, serde_json::json!({}))
        .await
        .unwrap();

    let rejecting = Dispatcher::new(
        Arc::new(RetryRejectingQueue {
            inner: app.services.queue.clone(),
        }),
        app.services.registry.clone(),
        app.services.executor.clone(),
        &app.settings.delivery,
    )
    .with_policy(RetryPolicy::immediate(3));
    assert_eq!(rejecting.process_ready().await.unwrap(), 1);

    let attempts = app.attempts.snapshot();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, AttemptStatus::InFlight);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let reaper = ClaimExpirationWorker::new(app.services.queue.clone(), Duration::ZERO);
    assert_eq!(reaper.release_expired_claims().await.unwrap(), 1);

    app.drain().await;
    assert_eq!(receiver.hits(), 4);

    let mut chain = app.attempts.snapshot();
    chain.sort_by_key(|a| a.attempt_number);
    assert_eq!(
        chain.iter().map(|a| a.status).collect::<Vec<_>>(),
        vec![
            AttemptStatus::Failed,
            AttemptStatus::Failed,
            AttemptStatus::Exhausted
        ]
    );
    let webhook = app
        .services
        .registry
        .get(webhook.id, team_id)
        .await
        .unwrap();
    assert_eq!(webhook.consecutive_failures, 1);
}

/// 可切换为拒绝登记终态失败的订阅仓库
struct TallyRejectingRepository {
    inner: InMemoryWebhookRepository,
    reject: AtomicBool,
}

#[async_trait]
impl WebhookRepository for TallyRejectingRepository {
    async fn create_within_limit(
        &self,
        webhook: &Webhook,
        limit: u64,
    ) -> Result<Webhook, RepositoryError> {
        self.inner.create_within_limit(webhook, limit).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Webhook>, RepositoryError> {
        self.inner.find_by_team(team_id).await
    }

    async fn find_active_for_event(
        &self,
        team_id: Uuid,
        event_type: WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        self.inner.find_active_for_event(team_id, event_type).await
    }

    async fn update(&self, id: Uuid, patch: &WebhookPatch) -> Result<Webhook, RepositoryError> {
        self.inner.update(id, patch).await
    }

    async fn rotate_secret(&self, id: Uuid, secret: &str) -> Result<Webhook, RepositoryError> {
        self.inner.rotate_secret(id, secret).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Webhook, RepositoryError> {
        self.inner.set_status(id, status).await
    }

    async fn reset_failures(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.inner.reset_failures(id).await
    }

    async fn record_terminal_failure(
        &self,
        id: Uuid,
        threshold: i32,
    ) -> Result<FailureTally, RepositoryError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(RepositoryError::Corrupt(
                "failure counter unavailable".to_string(),
            ));
        }
        self.inner.record_terminal_failure(id, threshold).await
    }
}

#[tokio::test]
async fn test_failed_tally_leaves_exhausted_attempt_in_flight() {
    let receiver = start_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::with_policy(1, 10);
    let repo = Arc::new(TallyRejectingRepository {
        inner: InMemoryWebhookRepository::new(),
        reject: AtomicBool::new(true),
    });
    let registry = SubscriptionRegistry::new(repo.clone(), app.settings.plans.clone());
    let team_id = Uuid::new_v4();
    let webhook = registry
        .create(
            team_id,
            PlanTier::Paid,
            create_request(&receiver.url, &["email.sent"]),
        )
        .await
        .unwrap();
    app.services
        .queue
        .enqueue(
            webhook.id,
            team_id,
            WebhookEventType::EmailSent,
            serde_json::json!({}),
        )
        .await
        .unwrap();

    let dispatcher = Dispatcher::new(
        app.services.queue.clone(),
        registry.clone(),
        app.services.executor.clone(),
        &app.settings.delivery,
    )
    .with_policy(RetryPolicy::immediate(1));
    dispatcher.process_ready().await.unwrap();

    let attempts = app.attempts.snapshot();
    assert_eq!(attempts[0].status, AttemptStatus::InFlight);
    assert_eq!(
        registry
            .get(webhook.id, team_id)
            .await
            .unwrap()
            .consecutive_failures,
        0
    );

    repo.reject.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(5)).await;
    let reaper = ClaimExpirationWorker::new(app.services.queue.clone(), Duration::ZERO);
    assert_eq!(reaper.release_expired_claims().await.unwrap(), 1);
    dispatcher.process_ready().await.unwrap();

    let attempts = app.attempts.snapshot();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, AttemptStatus::Exhausted);
    assert_eq!(
        registry
            .get(webhook.id, team_id)
            .await
            .unwrap()
            .consecutive_failures,
        1
    );
    assert_eq!(receiver.hits(), 2);
}
