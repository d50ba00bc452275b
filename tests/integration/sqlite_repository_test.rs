// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_request, start_receiver, test_settings};
use axum::http::StatusCode;
use chrono::Utc;
use hookrelay::application::dto::call_query_request::CallQueryRequestDto;
use hookrelay::application::services::WebhookServices;
use hookrelay::config::settings::DatabaseSettings;
use hookrelay::domain::models::call_record::{CallRecord, CallStatus};
use hookrelay::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use hookrelay::domain::models::webhook::{PlanTier, SubscriptionStatus, Webhook, WebhookEventType};
use hookrelay::domain::repositories::call_record_repository::{CallQuery, CallRecordRepository};
use hookrelay::domain::repositories::delivery_attempt_repository::DeliveryAttemptRepository;
use hookrelay::domain::repositories::webhook_repository::{
    RepositoryError, WebhookPatch, WebhookRepository,
};
use hookrelay::infrastructure::database::connection;
use hookrelay::infrastructure::repositories::call_record_repo_impl::CallRecordRepoImpl;
use hookrelay::infrastructure::repositories::delivery_attempt_repo_impl::DeliveryAttemptRepoImpl;
use hookrelay::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use hookrelay::infrastructure::services::webhook_service_impl::HttpWebhookSender;
use hookrelay::utils::retry_policy::RetryPolicy;
use sea_orm::DatabaseConnection;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

async fn setup_db() -> Arc<DatabaseConnection> {
    // A single connection keeps the in-memory database alive
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(5),
        idle_timeout: None,
    };
    Arc::new(connection::connect_and_migrate(&settings).await.unwrap())
}

fn webhook_for(team_id: Uuid, event_types: &[WebhookEventType]) -> Webhook {
    Webhook::new(
        team_id,
        "https://example.com/hook".to_string(),
        "whsec_sqlite_test_secret".to_string(),
        event_types.iter().copied().collect::<BTreeSet<_>>(),
        Uuid::new_v4(),
    )
}

#[tokio::test]
async fn test_webhook_round_trip_and_limit() {
    let db = setup_db().await;
    let repo = WebhookRepoImpl::new(db);
    let team_id = Uuid::new_v4();

    let webhook = webhook_for(
        team_id,
        &[WebhookEventType::EmailSent, WebhookEventType::EmailBounced],
    );
    repo.create_within_limit(&webhook, 2).await.unwrap();

    let stored = repo.find_by_id(webhook.id).await.unwrap().unwrap();
    assert_eq!(stored.id, webhook.id);
    assert_eq!(stored.event_types, webhook.event_types);
    assert_eq!(stored.status, SubscriptionStatus::Active);
    assert_eq!(stored.secret, webhook.secret);

    repo.create_within_limit(&webhook_for(team_id, &[WebhookEventType::EmailSent]), 2)
        .await
        .unwrap();
    let err = repo
        .create_within_limit(&webhook_for(team_id, &[WebhookEventType::EmailSent]), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::LimitReached { limit: 2 }));

    repo.set_status(webhook.id, SubscriptionStatus::Deleted)
        .await
        .unwrap();
    repo.create_within_limit(&webhook_for(team_id, &[WebhookEventType::EmailSent]), 2)
        .await
        .unwrap();
    assert_eq!(repo.find_by_team(team_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_partial_update_and_secret_rotation_touch_only_their_columns() {
    let db = setup_db().await;
    let repo = WebhookRepoImpl::new(db);
    let webhook = webhook_for(Uuid::new_v4(), &[WebhookEventType::EmailSent]);
    repo.create_within_limit(&webhook, 1).await.unwrap();

    let rotated = repo
        .rotate_secret(webhook.id, "whsec_rotated_sqlite_secret")
        .await
        .unwrap();
    assert_eq!(rotated.secret, "whsec_rotated_sqlite_secret");
    assert_eq!(rotated.url, webhook.url);

    let patched = repo
        .update(
            webhook.id,
            &WebhookPatch {
                url: Some("https://example.org/moved".to_string()),
                event_types: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.url, "https://example.org/moved");
    assert_eq!(patched.secret, "whsec_rotated_sqlite_secret");
    assert_eq!(patched.event_types, webhook.event_types);

    repo.set_status(webhook.id, SubscriptionStatus::Deleted)
        .await
        .unwrap();
    assert!(matches!(
        repo.set_status(webhook.id, SubscriptionStatus::Active).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.rotate_secret(webhook.id, "whsec_after_delete_secret").await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.update(webhook.id, &WebhookPatch::default()).await,
        Err(RepositoryError::NotFound)
    ));
    let stored = repo.find_by_id(webhook.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Deleted);
}

#[tokio::test]
async fn test_find_active_for_event_filters_status_and_type() {
    let db = setup_db().await;
    let repo = WebhookRepoImpl::new(db);
    let team_id = Uuid::new_v4();

    let sent = webhook_for(team_id, &[WebhookEventType::EmailSent]);
    let paused = webhook_for(team_id, &[WebhookEventType::EmailSent]);
    let opened = webhook_for(team_id, &[WebhookEventType::EmailOpened]);
    for webhook in [&sent, &paused, &opened] {
        repo.create_within_limit(webhook, 10).await.unwrap();
    }
    repo.set_status(paused.id, SubscriptionStatus::Paused)
        .await
        .unwrap();

    let found = repo
        .find_active_for_event(team_id, WebhookEventType::EmailSent)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, sent.id);
}

#[tokio::test]
async fn test_terminal_failures_disable_once() {
    let db = setup_db().await;
    let repo = WebhookRepoImpl::new(db);
    let webhook = webhook_for(Uuid::new_v4(), &[WebhookEventType::EmailSent]);
    repo.create_within_limit(&webhook, 1).await.unwrap();

    let first = repo.record_terminal_failure(webhook.id, 2).await.unwrap();
    assert_eq!(first.consecutive_failures, 1);
    assert!(!first.disabled);

    let second = repo.record_terminal_failure(webhook.id, 2).await.unwrap();
    assert_eq!(second.consecutive_failures, 2);
    assert!(second.disabled);

    let third = repo.record_terminal_failure(webhook.id, 2).await.unwrap();
    assert_eq!(third.consecutive_failures, 3);
    assert!(!third.disabled);

    let stored = repo.find_by_id(webhook.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Disabled);

    let reactivated = repo
        .set_status(webhook.id, SubscriptionStatus::Active)
        .await
        .unwrap();
    assert_eq!(reactivated.consecutive_failures, 0);

    assert!(matches!(
        repo.set_status(Uuid::new_v4(), SubscriptionStatus::Paused).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_attempt_claim_finish_and_release() {
    let db = setup_db().await;
    let webhooks = WebhookRepoImpl::new(db.clone());
    let attempts = DeliveryAttemptRepoImpl::new(db);
    let webhook = webhook_for(Uuid::new_v4(), &[WebhookEventType::EmailSent]);
    webhooks.create_within_limit(&webhook, 1).await.unwrap();

    let first = DeliveryAttempt::first(
        webhook.id,
        webhook.team_id,
        WebhookEventType::EmailSent,
        serde_json::json!({ "eventType": "email.sent" }),
        5,
    );
    attempts.create(&first).await.unwrap();
    let later = first.next(Utc::now() + chrono::Duration::hours(1));
    attempts.create(&later).await.unwrap();

    let claimed = attempts.claim_ready(Utc::now(), 10).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, first.id);
    assert_eq!(claimed[0].status, AttemptStatus::InFlight);
    assert_eq!(claimed[0].payload, first.payload);
    assert!(attempts.claim_ready(Utc::now(), 10).await.unwrap().is_empty());

    // Claimed before the cutoff, so it counts as stuck
    let released = attempts
        .release_stuck(Utc::now() + chrono::Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(released, 1);

    let reclaimed = attempts.claim_ready(Utc::now(), 10).await.unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert!(attempts
        .finish(first.id, AttemptStatus::Success)
        .await
        .unwrap());
    assert!(!attempts
        .finish(first.id, AttemptStatus::Failed)
        .await
        .unwrap());

    let chain = attempts.find_by_delivery(first.delivery_id).await.unwrap();
    assert_eq!(
        chain.iter().map(|a| a.attempt_number).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(chain[0].status, AttemptStatus::Success);
    assert!(chain[0].completed_at.is_some());
    assert_eq!(chain[1].status, AttemptStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_over_pool_claim_each_attempt_once() {
    let dir = tempfile::tempdir().unwrap();
    let settings = DatabaseSettings {
        url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("claims.db").display()
        ),
        max_connections: Some(4),
        min_connections: Some(1),
        connect_timeout: Some(10),
        idle_timeout: None,
    };
    let db = Arc::new(connection::connect_and_migrate(&settings).await.unwrap());
    let webhooks = WebhookRepoImpl::new(db.clone());
    let attempts = Arc::new(DeliveryAttemptRepoImpl::new(db));

    let webhook = webhook_for(Uuid::new_v4(), &[WebhookEventType::EmailSent]);
    webhooks.create_within_limit(&webhook, 1).await.unwrap();

    let mut expected = HashSet::new();
    for i in 0..24 {
        let attempt = DeliveryAttempt::first(
            webhook.id,
            webhook.team_id,
            WebhookEventType::EmailSent,
            serde_json::json!({ "seq": i }),
            5,
        );
        attempts.create(&attempt).await.unwrap();
        expected.insert(attempt.id);
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let attempts = attempts.clone();
            tokio::spawn(async move {
                let mut claimed = Vec::new();
                loop {
                    let batch = attempts.claim_ready(Utc::now(), 3).await.unwrap();
                    if batch.is_empty() {
                        return claimed;
                    }
                    claimed.extend(batch.into_iter().map(|a| a.id));
                }
            })
        })
        .collect();

    let mut all_claimed = Vec::new();
    for handle in handles {
        all_claimed.extend(handle.await.unwrap());
    }

    let unique: HashSet<Uuid> = all_claimed.iter().copied().collect();
    assert_eq!(all_claimed.len(), 24);
    assert_eq!(unique, expected);
}

#[tokio::test]
async fn test_call_records_page_and_reject_foreign_cursor() {
    let db = setup_db().await;
    let webhooks = WebhookRepoImpl::new(db.clone());
    let calls = CallRecordRepoImpl::new(db);
    let team_id = Uuid::new_v4();
    let webhook = webhook_for(team_id, &[WebhookEventType::EmailSent]);
    webhooks.create_within_limit(&webhook, 1).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let record = CallRecord::for_test(
            webhook.id,
            team_id,
            WebhookEventType::EmailSent,
            serde_json::json!({}),
        );
        calls.append(&record).await.unwrap();
        ids.push(record.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    ids.reverse();

    let first_page = calls
        .list(&CallQuery {
            team_id,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        first_page.iter().map(|r| r.id).collect::<Vec<_>>(),
        ids[..2].to_vec()
    );

    let from_cursor = calls
        .list(&CallQuery {
            team_id,
            cursor: Some(ids[1]),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        from_cursor.iter().map(|r| r.id).collect::<Vec<_>>(),
        ids[1..].to_vec()
    );

    let foreign = calls
        .list(&CallQuery {
            team_id: Uuid::new_v4(),
            cursor: Some(ids[0]),
            limit: 10,
            ..Default::default()
        })
        .await;
    assert!(matches!(foreign, Err(RepositoryError::NotFound)));

    let pending = calls
        .list(&CallQuery {
            team_id,
            status: Some(CallStatus::Pending),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 3);
}

#[tokio::test]
async fn test_delivery_pipeline_over_database() {
    let receiver = start_receiver(StatusCode::BAD_GATEWAY).await;
    let db = setup_db().await;
    let settings = test_settings(3, 10);
    let sender = HttpWebhookSender::new(&settings.delivery).unwrap();
    let services = WebhookServices::with_database(db, Arc::new(sender), &settings);
    let team_id = Uuid::new_v4();

    let webhook = services
        .registry
        .create(
            team_id,
            PlanTier::Free,
            create_request(&receiver.url, &["email.complained"]),
        )
        .await
        .unwrap();

    let attempts = services
        .publish_event
        .publish(
            team_id,
            WebhookEventType::EmailComplained,
            serde_json::json!({ "emailId": "db-1" }),
        )
        .await
        .unwrap();
    assert_eq!(attempts.len(), 1);

    let dispatcher = services.dispatcher().with_policy(RetryPolicy::immediate(3));
    while dispatcher.process_ready().await.unwrap() > 0 {}

    assert_eq!(receiver.hits(), 3);

    let history = services
        .ledger
        .history(attempts[0].delivery_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|r| r.status == CallStatus::Failed));
    assert!(history.iter().all(|r| r.response_status == Some(502)));

    let page = services
        .ledger
        .list(team_id, CallQueryRequestDto::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);

    let stored = services.registry.get(webhook.id, team_id).await.unwrap();
    assert_eq!(stored.consecutive_failures, 1);
}
