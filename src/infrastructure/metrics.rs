// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 执行的投递尝试数
pub const DELIVERY_ATTEMPTS_TOTAL: &str = "webhook_delivery_attempts_total";
/// 成功的投递数
pub const DELIVERY_SUCCESS_TOTAL: &str = "webhook_delivery_success_total";
/// 失败的投递数，标签 `reason`
pub const DELIVERY_FAILED_TOTAL: &str = "webhook_delivery_failed_total";
/// 重试预算耗尽的逻辑投递数
pub const DELIVERY_EXHAUSTED_TOTAL: &str = "webhook_delivery_exhausted_total";
/// 熔断禁用的订阅数
pub const SUBSCRIPTION_DISABLED_TOTAL: &str = "webhook_subscription_disabled_total";
/// 单次投递耗时
pub const DELIVERY_DURATION_SECONDS: &str = "webhook_delivery_duration_seconds";
/// 领取的尝试数
pub const ATTEMPTS_CLAIMED_TOTAL: &str = "webhook_attempts_claimed_total";
/// 被回收的卡住尝试数
pub const ATTEMPTS_RELEASED_TOTAL: &str = "webhook_attempts_released_total";
/// 入队的逻辑投递数
pub const DELIVERIES_ENQUEUED_TOTAL: &str = "webhook_deliveries_enqueued_total";

pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}
