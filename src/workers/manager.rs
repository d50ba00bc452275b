// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::webhook_worker::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 分发器工作池
///
/// 固定数量的分发器各自独立轮询队列
pub struct DispatcherPool {
    dispatcher: Arc<Dispatcher>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl DispatcherPool {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            dispatcher: Arc::new(dispatcher),
            shutdown,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let dispatcher = self.dispatcher.clone();
            let shutdown = self.shutdown.subscribe();
            let handle = tokio::spawn(async move {
                dispatcher.run(shutdown).await;
            });
            self.handles.push(handle);
        }
        info!("Started {} webhook dispatcher workers", count);
    }

    /// 运行中的工作进程数量
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// 通知所有工作进程停止，等待当前批次完成
    ///
    /// 超过 `grace` 仍未退出的工作进程会被中止；
    /// 被中止的 IN_FLIGHT 尝试之后由回收工作器放回队列
    pub async fn shutdown(self, grace: Duration) {
        info!("Shutting down webhook dispatchers...");
        let _ = self.shutdown.send(true);

        for mut handle in self.handles {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Dispatcher task failed: {}", e),
                Err(_) => {
                    warn!("Dispatcher did not stop within {:?}, aborting", grace);
                    handle.abort();
                }
            }
        }

        info!("Webhook dispatchers shut down");
    }
}

/// 等待 Ctrl-C
pub async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
