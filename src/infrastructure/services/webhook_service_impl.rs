// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DeliverySettings;
use crate::domain::services::webhook_service::{DeliveryResponse, OutboundRequest, WebhookSender};
use crate::utils::errors::DeliveryError;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use std::time::Duration;

/// 基于 reqwest 的 Webhook 发送实现
#[derive(Clone)]
pub struct HttpWebhookSender {
    /// HTTP 客户端
    client: Client,
    /// 响应体捕获上限
    body_limit: usize,
}

impl HttpWebhookSender {
    /// 创建新的发送器
    ///
    /// 客户端带总超时、不跟随重定向；User-Agent 非法时返回错误
    pub fn new(settings: &DeliverySettings) -> anyhow::Result<Self> {
        let user_agent = header::HeaderValue::from_str(&settings.user_agent)
            .with_context(|| format!("invalid delivery.user_agent {:?}", settings.user_agent))?;
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, user_agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            body_limit: settings.response_body_limit,
        })
    }

    async fn read_bounded(&self, mut response: reqwest::Response) -> Option<String> {
        let mut captured: Vec<u8> = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = self.body_limit.saturating_sub(captured.len());
                    captured.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
                    if captured.len() >= self.body_limit {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => break,
            }
        }

        if captured.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&captured).into_owned())
        }
    }
}

fn classify(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else if err.is_connect() {
        DeliveryError::Connect(err.to_string())
    } else {
        DeliveryError::Request(err.to_string())
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, request: &OutboundRequest) -> Result<DeliveryResponse, DeliveryError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = self.read_bounded(response).await;

        Ok(DeliveryResponse { status, body })
    }
}
