// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::webhook::WebhookEventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 投递尝试实体
///
/// 表示一次计划中的投递（或重试）。同一逻辑投递的所有重试共享
/// `delivery_id`，每次重试是一条新的记录，`attempt_number` 递增。
/// 在到达终态之前，投递尝试只归投递队列与分发器所有。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAttempt {
    /// 尝试唯一标识符
    pub id: Uuid,
    /// 逻辑投递标识符，所有重试共享
    pub delivery_id: Uuid,
    /// 目标订阅ID
    pub subscription_id: Uuid,
    /// 所属团队ID
    pub team_id: Uuid,
    /// 事件类型
    pub event_type: WebhookEventType,
    /// 事件负载快照（不可变）
    pub payload: serde_json::Value,
    /// 第几次尝试，从1开始
    pub attempt_number: i32,
    /// 本逻辑投递的最大尝试次数
    pub max_attempts: i32,
    /// 计划执行时间
    pub scheduled_at: DateTime<Utc>,
    /// 当前状态
    pub status: AttemptStatus,
    /// 被领取的时间
    pub claimed_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeliveryAttempt {
    /// 创建一个新逻辑投递的首次尝试
    pub fn first(
        subscription_id: Uuid,
        team_id: Uuid,
        event_type: WebhookEventType,
        payload: serde_json::Value,
        max_attempts: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            delivery_id: Uuid::new_v4(),
            subscription_id,
            team_id,
            event_type,
            payload,
            attempt_number: 1,
            max_attempts,
            scheduled_at: now,
            status: AttemptStatus::Pending,
            claimed_at: None,
            created_at: now,
            completed_at: None,
        }
    }

    /// 基于当前尝试创建下一次重试，负载保持不变
    pub fn next(&self, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            delivery_id: self.delivery_id,
            subscription_id: self.subscription_id,
            team_id: self.team_id,
            event_type: self.event_type,
            payload: self.payload.clone(),
            attempt_number: self.attempt_number + 1,
            max_attempts: self.max_attempts,
            scheduled_at,
            status: AttemptStatus::Pending,
            claimed_at: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 是否为最后一次允许的尝试
    pub fn is_last(&self) -> bool {
        self.attempt_number >= self.max_attempts
    }
}

/// 投递尝试状态
///
/// PENDING → IN_FLIGHT → SUCCESS | FAILED | EXHAUSTED。
/// FAILED 表示该次尝试失败且已安排下一次重试；
/// EXHAUSTED 表示重试预算耗尽。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    #[default]
    Pending,
    InFlight,
    Success,
    Failed,
    Exhausted,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptStatus::Success | AttemptStatus::Failed | AttemptStatus::Exhausted
        )
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttemptStatus::Pending => write!(f, "pending"),
            AttemptStatus::InFlight => write!(f, "in_flight"),
            AttemptStatus::Success => write!(f, "success"),
            AttemptStatus::Failed => write!(f, "failed"),
            AttemptStatus::Exhausted => write!(f, "exhausted"),
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AttemptStatus::Pending),
            "in_flight" => Ok(AttemptStatus::InFlight),
            "success" => Ok(AttemptStatus::Success),
            "failed" => Ok(AttemptStatus::Failed),
            "exhausted" => Ok(AttemptStatus::Exhausted),
            _ => Err(()),
        }
    }
}
