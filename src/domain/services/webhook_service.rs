// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::signer;
use crate::domain::models::webhook::WebhookEventType;
use crate::utils::errors::DeliveryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 已签名的出站请求
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// 目标URL
    pub url: String,
    /// 原始请求体（JSON）
    pub body: Vec<u8>,
    /// 附加请求头
    pub headers: Vec<(&'static str, String)>,
}

impl OutboundRequest {
    /// 构建一个带签名和时间戳请求头的 POST 请求
    pub fn signed(
        url: &str,
        secret: &str,
        payload: &serde_json::Value,
        event_type: WebhookEventType,
        call_id: Uuid,
        timestamp: i64,
    ) -> Self {
        let body = payload.to_string().into_bytes();
        let signature = signer::sign(secret, &body, timestamp);

        Self {
            url: url.to_string(),
            headers: vec![
                (signer::SIGNATURE_HEADER, signature),
                (signer::TIMESTAMP_HEADER, timestamp.to_string()),
                (signer::EVENT_HEADER, event_type.to_string()),
                (signer::CALL_ID_HEADER, call_id.to_string()),
            ],
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// 端点返回的响应（任意状态码）
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResponse {
    pub status: u16,
    /// 截断后的响应体
    pub body: Option<String>,
}

impl DeliveryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Webhook发送特质
///
/// 只负责一次传输：带超时、不做传输层重试。
/// 重试完全由分发器的策略驱动。
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// 发送请求
    ///
    /// # 返回值
    ///
    /// * `Ok(DeliveryResponse)` - 收到了HTTP响应（不论状态码）
    /// * `Err(DeliveryError)` - 超时、连接失败等网络层错误
    async fn send(&self, request: &OutboundRequest) -> Result<DeliveryResponse, DeliveryError>;
}
