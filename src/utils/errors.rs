// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{SubscriptionStatus, UnknownEventType};
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::queue::delivery_queue::QueueError;
use thiserror::Error;

/// 订阅管理与手动操作的错误类型
///
/// 这些错误会返回给调用方；投递层面的失败不在此列，
/// 它们由分发器的重试机制完全吸收。
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Webhook limit reached: current plan allows {limit} webhook(s)")]
    QuotaExceeded { limit: u64 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Queue error: {0}")]
    Queue(String),
}

impl From<RepositoryError> for WebhookError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => WebhookError::NotFound("Record"),
            RepositoryError::LimitReached { limit } => WebhookError::QuotaExceeded { limit },
            other => WebhookError::Repository(other),
        }
    }
}

impl From<QueueError> for WebhookError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Repository(e) => e.into(),
            other => WebhookError::Queue(other.to_string()),
        }
    }
}

impl From<UnknownEventType> for WebhookError {
    fn from(err: UnknownEventType) -> Self {
        WebhookError::Validation(err.to_string())
    }
}

/// 投递失败
///
/// 传输错误或非 2xx 响应。只在分发器内部驱动重试策略，
/// 对端点所有者只通过调用历史可见。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("endpoint responded with status {status}")]
    Status { status: u16, body: Option<String> },

    #[error("request failed: {0}")]
    Request(String),
}

impl DeliveryError {
    /// 指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            DeliveryError::Timeout => "timeout",
            DeliveryError::Connect(_) => "network_error",
            DeliveryError::Status { .. } => "http_error",
            DeliveryError::Request(_) => "request_error",
        }
    }
}
