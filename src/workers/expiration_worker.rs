// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::metrics::ATTEMPTS_RELEASED_TOTAL;
use crate::queue::delivery_queue::{DeliveryQueue, QueueError};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 领取过期回收工作器
///
/// 工作器崩溃时留下的 IN_FLIGHT 尝试会被定期放回 PENDING
pub struct ClaimExpirationWorker {
    queue: Arc<dyn DeliveryQueue>,
    interval: Duration,
    stuck_after: Duration,
}

impl ClaimExpirationWorker {
    pub fn new(queue: Arc<dyn DeliveryQueue>, stuck_after: Duration) -> Self {
        Self {
            queue,
            interval: (stuck_after / 2).max(Duration::from_secs(1)),
            stuck_after,
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Claim expiration worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.release_expired_claims().await {
                error!("Failed to release stuck webhook attempts: {}", e);
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// 回收一次，返回被放回队列的数量
    pub async fn release_expired_claims(&self) -> Result<u64, QueueError> {
        let released = self.queue.release_stuck(self.stuck_after).await?;
        if released > 0 {
            counter!(ATTEMPTS_RELEASED_TOTAL).increment(released);
            info!("Released {} stuck webhook attempts", released);
        }
        Ok(released)
    }
}
