// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Webhook订阅实体
///
/// 表示团队注册的一个Webhook端点。订阅按事件类型接收通知，
/// 并持有用于请求签名的密钥。删除为软删除，
/// 只要调用历史仍引用该订阅，记录就不会被物理移除。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Webhook {
    /// Webhook唯一标识符
    pub id: Uuid,
    /// 所属团队ID，用于权限隔离和配额计算
    pub team_id: Uuid,
    /// 回调URL，接收通知的目标地址
    pub url: String,
    /// 签名密钥（不透明令牌）
    pub secret: String,
    /// 订阅的事件类型集合，不可为空
    pub event_types: BTreeSet<WebhookEventType>,
    /// 订阅状态
    pub status: SubscriptionStatus,
    /// 连续终态失败次数
    pub consecutive_failures: i32,
    /// 创建者用户ID
    pub created_by_user_id: Uuid,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// 创建一个新的处于ACTIVE状态的订阅
    pub fn new(
        team_id: Uuid,
        url: String,
        secret: String,
        event_types: BTreeSet<WebhookEventType>,
        created_by_user_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            team_id,
            url,
            secret,
            event_types,
            status: SubscriptionStatus::Active,
            consecutive_failures: 0,
            created_by_user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否订阅了给定事件类型
    pub fn subscribes_to(&self, event_type: WebhookEventType) -> bool {
        self.event_types.contains(&event_type)
    }

    /// 是否可以被事件解析命中
    pub fn accepts_events(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// 是否已被软删除
    pub fn is_deleted(&self) -> bool {
        self.status == SubscriptionStatus::Deleted
    }
}

/// Webhook事件类型
///
/// 封闭的事件集合，在边界处校验。未知的事件标签会被拒绝，
/// 不会被静默丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WebhookEventType {
    /// 邮件已发送
    #[serde(rename = "email.sent")]
    EmailSent,
    /// 邮件已送达收件服务器
    #[serde(rename = "email.delivered")]
    EmailDelivered,
    /// 邮件被退回
    #[serde(rename = "email.bounced")]
    EmailBounced,
    /// 邮件被打开
    #[serde(rename = "email.opened")]
    EmailOpened,
    /// 邮件中的链接被点击
    #[serde(rename = "email.clicked")]
    EmailClicked,
    /// 收件人投诉为垃圾邮件
    #[serde(rename = "email.complained")]
    EmailComplained,
    /// 联系人退订
    #[serde(rename = "contact.unsubscribed")]
    ContactUnsubscribed,
}

impl WebhookEventType {
    /// 全部事件类型
    pub const ALL: [WebhookEventType; 7] = [
        WebhookEventType::EmailSent,
        WebhookEventType::EmailDelivered,
        WebhookEventType::EmailBounced,
        WebhookEventType::EmailOpened,
        WebhookEventType::EmailClicked,
        WebhookEventType::EmailComplained,
        WebhookEventType::ContactUnsubscribed,
    ];

    /// 事件标签
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventType::EmailSent => "email.sent",
            WebhookEventType::EmailDelivered => "email.delivered",
            WebhookEventType::EmailBounced => "email.bounced",
            WebhookEventType::EmailOpened => "email.opened",
            WebhookEventType::EmailClicked => "email.clicked",
            WebhookEventType::EmailComplained => "email.complained",
            WebhookEventType::ContactUnsubscribed => "contact.unsubscribed",
        }
    }

    /// 测试投递使用的示例数据
    pub fn sample_data(&self) -> serde_json::Value {
        let base = serde_json::json!({
            "emailId": "00000000-0000-0000-0000-000000000000",
            "from": "sender@example.com",
            "to": ["recipient@example.com"],
            "subject": "Test webhook",
        });
        match self {
            WebhookEventType::EmailBounced => merge(
                base,
                serde_json::json!({ "bounce": { "type": "hard", "message": "mailbox unavailable" } }),
            ),
            WebhookEventType::EmailClicked => merge(
                base,
                serde_json::json!({ "click": { "link": "https://example.com" } }),
            ),
            WebhookEventType::ContactUnsubscribed => serde_json::json!({
                "contactId": "00000000-0000-0000-0000-000000000000",
                "email": "recipient@example.com",
            }),
            _ => base,
        }
    }
}

fn merge(mut base: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
    if let (Some(target), serde_json::Value::Object(source)) = (base.as_object_mut(), extra) {
        target.extend(source);
    }
    base
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知事件类型错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for WebhookEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookEventType::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// 订阅状态
///
/// ACTIVE → PAUSED/DISABLED 可由操作者切换；
/// 熔断会自动切换到 DISABLED；DELETED 只能通过删除操作到达。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// 活跃，接收事件
    #[default]
    Active,
    /// 暂停，由操作者暂停
    Paused,
    /// 禁用，通常由熔断器触发
    Disabled,
    /// 已删除（软删除）
    Deleted,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Paused => write!(f, "paused"),
            SubscriptionStatus::Disabled => write!(f, "disabled"),
            SubscriptionStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "paused" => Ok(SubscriptionStatus::Paused),
            "disabled" => Ok(SubscriptionStatus::Disabled),
            "deleted" => Ok(SubscriptionStatus::Deleted),
            _ => Err(()),
        }
    }
}

/// 套餐等级，决定团队可持有的未删除订阅数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Paid,
}

/// 事件信封
///
/// 投递请求体的不可变快照，至少包含 `eventType` 与事件数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: Uuid,
    pub event_type: WebhookEventType,
    pub created_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(event_type: WebhookEventType, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            created_at: Utc::now(),
            data,
        }
    }

    /// 为测试投递构造示例信封
    pub fn sample(event_type: WebhookEventType) -> Self {
        let mut envelope = Self::new(event_type, event_type.sample_data());
        if let Some(data) = envelope.data.as_object_mut() {
            data.insert("test".to_string(), serde_json::Value::Bool(true));
        }
        envelope
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "eventType": self.event_type,
            "createdAt": self.created_at,
            "data": self.data,
        })
    }
}
