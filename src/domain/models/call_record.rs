// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::delivery::DeliveryAttempt;
use super::webhook::WebhookEventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 调用记录
///
/// 一次投递执行的审计条目。每次执行（包括重试和手动测试）
/// 产生一条新记录；记录从 PENDING 关闭到终态后不再变化。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub team_id: Uuid,
    /// 逻辑投递ID；手动测试调用为空
    pub delivery_id: Option<Uuid>,
    /// 产生本记录的投递尝试ID；手动测试调用为空
    pub attempt_id: Option<Uuid>,
    pub attempt_number: i32,
    pub event_type: WebhookEventType,
    pub request_payload: serde_json::Value,
    /// 网络层失败时为空
    pub response_status: Option<i32>,
    /// 截断后的响应体
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    /// 为队列中的投递尝试打开一条待定记录
    pub fn for_attempt(attempt: &DeliveryAttempt) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id: attempt.subscription_id,
            team_id: attempt.team_id,
            delivery_id: Some(attempt.delivery_id),
            attempt_id: Some(attempt.id),
            attempt_number: attempt.attempt_number,
            event_type: attempt.event_type,
            request_payload: attempt.payload.clone(),
            response_status: None,
            response_body: None,
            error_message: None,
            duration_ms: 0,
            status: CallStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// 为不经过队列的手动测试打开一条待定记录
    pub fn for_test(
        webhook_id: Uuid,
        team_id: Uuid,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id,
            team_id,
            delivery_id: None,
            attempt_id: None,
            attempt_number: 1,
            event_type,
            request_payload: payload,
            response_status: None,
            response_body: None,
            error_message: None,
            duration_ms: 0,
            status: CallStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// 调用结果，用于关闭待定记录
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub status: CallStatus,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: i64,
}

/// 调用记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CallStatus::Pending => write!(f, "pending"),
            CallStatus::Success => write!(f, "success"),
            CallStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for CallStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(CallStatus::Pending),
            "success" => Ok(CallStatus::Success),
            "failed" => Ok(CallStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 一页调用记录
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallPage {
    pub items: Vec<CallRecord>,
    /// 第一条被排除记录的ID；为空表示没有更多数据
    pub next_cursor: Option<Uuid>,
}
