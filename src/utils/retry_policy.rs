// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DeliverySettings;
use std::time::Duration;

/// 重试策略配置
///
/// `delay = initial_backoff * multiplier^(attempt-1)`，限制在 `max_backoff` 内，
/// 再叠加 `±jitter_factor` 比例的随机抖动。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 单个逻辑投递的最大尝试次数（包含首次）
    pub max_attempts: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(3600),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl From<&DeliverySettings> for RetryPolicy {
    fn from(settings: &DeliverySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.base_backoff_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            backoff_multiplier: 2.0,
            jitter_factor: settings.jitter_factor.clamp(0.0, 1.0),
        }
    }
}

impl RetryPolicy {
    /// 不等待的策略，便于测试
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    /// 计算第 `attempt` 次尝试失败后的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        let jitter_range = capped_backoff * self.jitter_factor;
        let final_backoff = if jitter_range > 0.0 {
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        // Values past what Duration can hold fall back to the cap
        Duration::try_from_secs_f64(final_backoff).unwrap_or(self.max_backoff)
    }

    /// 第 `attempt` 次尝试失败后是否还能重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
