// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DeliverySettings;
use crate::domain::models::call_record::CallRecord;
use crate::domain::models::delivery::{AttemptStatus, DeliveryAttempt};
use crate::domain::services::delivery_executor::DeliveryExecutor;
use crate::domain::services::subscription_registry::SubscriptionRegistry;
use crate::infrastructure::metrics::{
    ATTEMPTS_CLAIMED_TOTAL, DELIVERY_ATTEMPTS_TOTAL, DELIVERY_DURATION_SECONDS,
    DELIVERY_EXHAUSTED_TOTAL, DELIVERY_FAILED_TOTAL, DELIVERY_SUCCESS_TOTAL,
    SUBSCRIPTION_DISABLED_TOTAL,
};
use crate::queue::delivery_queue::DeliveryQueue;
use crate::utils::errors::WebhookError;
use crate::utils::retry_policy::RetryPolicy;
use futures::StreamExt;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 投递分发器
///
/// 从队列领取就绪的尝试，签名发送并记账，
/// 然后根据结果关闭尝试、安排重试或登记终态失败。
#[derive(Clone)]
pub struct Dispatcher {
    /// 投递队列
    queue: Arc<dyn DeliveryQueue>,
    /// 订阅注册表
    registry: SubscriptionRegistry,
    /// 共用发送路径
    executor: DeliveryExecutor,
    /// 重试退避策略
    policy: RetryPolicy,
    /// 熔断阈值
    failure_threshold: i32,
    /// 每次领取的最大数量
    batch_size: u64,
    /// 空闲时的轮询间隔
    poll_interval: Duration,
}

impl Dispatcher {
    /// 创建新的分发器
    ///
    /// # 参数
    ///
    /// * `queue` - 投递队列
    /// * `registry` - 订阅注册表
    /// * `executor` - 发送路径
    /// * `settings` - 投递策略配置
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        registry: SubscriptionRegistry,
        executor: DeliveryExecutor,
        settings: &DeliverySettings,
    ) -> Self {
        Self {
            queue,
            registry,
            executor,
            policy: RetryPolicy::from(settings),
            failure_threshold: settings.failure_threshold,
            batch_size: settings.batch_size.max(1),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }

    /// 替换重试策略
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 运行分发循环，直到收到关闭信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Webhook dispatcher started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let processed = match self.process_ready().await {
                Ok(count) => count,
                Err(e) => {
                    error!("Error processing webhook deliveries: {}", e);
                    0
                }
            };

            // Keep draining while there is work
            if processed > 0 {
                continue;
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Webhook dispatcher stopped");
    }

    /// 领取并处理一批就绪的尝试
    ///
    /// # 返回值
    ///
    /// 本批领取的尝试数量
    pub async fn process_ready(&self) -> anyhow::Result<usize> {
        let attempts = self.queue.dequeue_ready(self.batch_size).await?;
        if attempts.is_empty() {
            return Ok(0);
        }

        let count = attempts.len();
        counter!(ATTEMPTS_CLAIMED_TOTAL).increment(count as u64);
        info!("Processing {} ready webhook attempts", count);

        futures::stream::iter(attempts)
            .for_each_concurrent(self.batch_size as usize, |attempt| async move {
                let attempt_id = attempt.id;
                if let Err(e) = self.deliver(attempt).await {
                    error!("Failed to process webhook attempt {}: {}", attempt_id, e);
                }
            })
            .await;

        Ok(count)
    }

    /// 处理一个已领取的尝试
    pub async fn deliver(&self, attempt: DeliveryAttempt) -> anyhow::Result<()> {
        let webhook = match self
            .registry
            .get(attempt.subscription_id, attempt.team_id)
            .await
        {
            Ok(webhook) => webhook,
            Err(WebhookError::NotFound(_)) => {
                warn!(
                    "Dropping attempt {}: webhook {} no longer exists",
                    attempt.id, attempt.subscription_id
                );
                self.queue.complete(attempt.id, AttemptStatus::Failed).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Delivering attempt {} ({}/{}) of {} to webhook {}",
            attempt.id, attempt.attempt_number, attempt.max_attempts, attempt.event_type, webhook.id
        );
        counter!(DELIVERY_ATTEMPTS_TOTAL).increment(1);

        let executed = self
            .executor
            .execute(&webhook, CallRecord::for_attempt(&attempt))
            .await?;
        histogram!(DELIVERY_DURATION_SECONDS).record(executed.record.duration_ms as f64 / 1000.0);

        // Follow-up state is written before the attempt leaves IN_FLIGHT, so
        // an error here leaves the attempt to the claim expiration worker
        let Some(failure) = executed.failure else {
            self.registry.record_success(webhook.id).await?;
            self.queue.complete(attempt.id, AttemptStatus::Success).await?;
            counter!(DELIVERY_SUCCESS_TOTAL).increment(1);
            info!("Attempt {} delivered to webhook {}", attempt.id, webhook.id);
            return Ok(());
        };

        counter!(DELIVERY_FAILED_TOTAL, "reason" => failure.reason()).increment(1);
        warn!(
            "Attempt {} to webhook {} failed: {}",
            attempt.id, webhook.id, failure
        );

        if attempt.is_last() || !self.policy.should_retry(attempt.attempt_number as u32) {
            let tally = self
                .registry
                .record_terminal_failure(webhook.id, self.failure_threshold)
                .await?;
            if tally.disabled {
                counter!(SUBSCRIPTION_DISABLED_TOTAL).increment(1);
            }

            self.queue
                .complete(attempt.id, AttemptStatus::Exhausted)
                .await?;
            counter!(DELIVERY_EXHAUSTED_TOTAL).increment(1);
            info!(
                "Delivery {} exhausted after {} attempts",
                attempt.delivery_id, attempt.attempt_number
            );
            return Ok(());
        }

        // The outcome is already closed in the call ledger
        let delay = self.policy.calculate_backoff(attempt.attempt_number as u32);
        let retry = self.queue.enqueue_retry(&attempt, delay).await?;
        self.queue.complete(attempt.id, AttemptStatus::Failed).await?;
        info!(
            "Retry {} of delivery {} scheduled at {}",
            retry.attempt_number, retry.delivery_id, retry.scheduled_at
        );

        Ok(())
    }
}
