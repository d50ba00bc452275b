// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{DeliverySettings, PlanSettings, Settings};
use crate::domain::repositories::call_record_repository::CallRecordRepository;
use crate::domain::repositories::delivery_attempt_repository::DeliveryAttemptRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::call_ledger::CallLedger;
use crate::domain::services::delivery_executor::DeliveryExecutor;
use crate::domain::services::subscription_registry::SubscriptionRegistry;
use crate::domain::services::webhook_service::WebhookSender;
use crate::domain::use_cases::publish_event::PublishEventUseCase;
use crate::domain::use_cases::retry_call::RetryCallUseCase;
use crate::domain::use_cases::test_webhook::TestWebhookUseCase;
use crate::infrastructure::repositories::call_record_repo_impl::CallRecordRepoImpl;
use crate::infrastructure::repositories::delivery_attempt_repo_impl::DeliveryAttemptRepoImpl;
use crate::infrastructure::repositories::memory::{
    InMemoryCallRecordRepository, InMemoryDeliveryAttemptRepository, InMemoryWebhookRepository,
};
use crate::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use crate::queue::delivery_queue::{DeliveryQueue, RepositoryDeliveryQueue};
use crate::workers::expiration_worker::ClaimExpirationWorker;
use crate::workers::webhook_worker::Dispatcher;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// 组装好的 Webhook 服务
///
/// HTTP 层与后台工作器共享同一组注册表、账本和队列
#[derive(Clone)]
pub struct WebhookServices {
    pub registry: SubscriptionRegistry,
    pub ledger: CallLedger,
    pub queue: Arc<dyn DeliveryQueue>,
    pub executor: DeliveryExecutor,
    pub publish_event: Arc<PublishEventUseCase>,
    pub test_webhook: Arc<TestWebhookUseCase>,
    pub retry_call: Arc<RetryCallUseCase>,
    delivery: DeliverySettings,
}

impl WebhookServices {
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        attempts: Arc<dyn DeliveryAttemptRepository>,
        calls: Arc<dyn CallRecordRepository>,
        sender: Arc<dyn WebhookSender>,
        plans: PlanSettings,
        delivery: DeliverySettings,
    ) -> Self {
        let registry = SubscriptionRegistry::new(webhooks, plans);
        let ledger = CallLedger::new(calls);
        let queue: Arc<dyn DeliveryQueue> =
            Arc::new(RepositoryDeliveryQueue::new(attempts, delivery.max_attempts));
        let executor = DeliveryExecutor::new(sender, ledger.clone());

        Self {
            publish_event: Arc::new(PublishEventUseCase::new(registry.clone(), queue.clone())),
            test_webhook: Arc::new(TestWebhookUseCase::new(registry.clone(), executor.clone())),
            retry_call: Arc::new(RetryCallUseCase::new(
                ledger.clone(),
                registry.clone(),
                queue.clone(),
            )),
            registry,
            ledger,
            queue,
            executor,
            delivery,
        }
    }

    /// 基于 SeaORM 仓库组装
    pub fn with_database(
        db: Arc<DatabaseConnection>,
        sender: Arc<dyn WebhookSender>,
        settings: &Settings,
    ) -> Self {
        Self::new(
            Arc::new(WebhookRepoImpl::new(db.clone())),
            Arc::new(DeliveryAttemptRepoImpl::new(db.clone())),
            Arc::new(CallRecordRepoImpl::new(db)),
            sender,
            settings.plans.clone(),
            settings.delivery.clone(),
        )
    }

    /// 基于进程内仓库组装
    pub fn in_memory(sender: Arc<dyn WebhookSender>, settings: &Settings) -> Self {
        Self::new(
            Arc::new(InMemoryWebhookRepository::new()),
            Arc::new(InMemoryDeliveryAttemptRepository::new()),
            Arc::new(InMemoryCallRecordRepository::new()),
            sender,
            settings.plans.clone(),
            settings.delivery.clone(),
        )
    }

    /// 按投递配置创建分发器
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.queue.clone(),
            self.registry.clone(),
            self.executor.clone(),
            &self.delivery,
        )
    }

    /// 创建卡住尝试的回收工作器
    pub fn claim_expiration_worker(&self) -> ClaimExpirationWorker {
        ClaimExpirationWorker::new(
            self.queue.clone(),
            Duration::from_secs(self.delivery.stuck_after_secs),
        )
    }
}
