// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::call_ledger::CallLedger;
use super::webhook_service::{DeliveryResponse, OutboundRequest, WebhookSender};
use crate::domain::models::call_record::{CallOutcome, CallRecord, CallStatus};
use crate::domain::models::webhook::Webhook;
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::utils::errors::DeliveryError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// 一次已执行并已记账的调用
#[derive(Debug, Clone)]
pub struct ExecutedCall {
    /// 已关闭的调用记录
    pub record: CallRecord,
    /// 失败原因；成功时为空
    pub failure: Option<DeliveryError>,
}

/// 调用执行器
///
/// 队列投递与手动测试共用的发送路径：先写 PENDING 记录，
/// 签名并发送，再以结果关闭记录。
#[derive(Clone)]
pub struct DeliveryExecutor {
    sender: Arc<dyn WebhookSender>,
    ledger: CallLedger,
}

impl DeliveryExecutor {
    pub fn new(sender: Arc<dyn WebhookSender>, ledger: CallLedger) -> Self {
        Self { sender, ledger }
    }

    /// 向订阅端点发送 `record` 中的负载
    ///
    /// 投递失败不会作为错误返回，只体现在 `ExecutedCall::failure` 中；
    /// 只有记账失败才返回错误。
    pub async fn execute(
        &self,
        webhook: &Webhook,
        record: CallRecord,
    ) -> Result<ExecutedCall, RepositoryError> {
        let record = self.ledger.open(record).await?;
        let request = OutboundRequest::signed(
            &webhook.url,
            &webhook.secret,
            &record.request_payload,
            record.event_type,
            record.id,
            Utc::now().timestamp(),
        );

        let started = Instant::now();
        let result = self.sender.send(&request).await;
        let duration_ms = started.elapsed().as_millis() as i64;

        let (outcome, failure) = classify(result, duration_ms);
        debug!(
            "Call {} to webhook {} finished as {} in {}ms",
            record.id, webhook.id, outcome.status, duration_ms
        );

        let record = self.ledger.close(record.id, &outcome).await?;
        Ok(ExecutedCall { record, failure })
    }
}

fn classify(
    result: Result<DeliveryResponse, DeliveryError>,
    duration_ms: i64,
) -> (CallOutcome, Option<DeliveryError>) {
    match result {
        Ok(response) if response.is_success() => (
            CallOutcome {
                status: CallStatus::Success,
                response_status: Some(i32::from(response.status)),
                response_body: response.body,
                error_message: None,
                duration_ms,
            },
            None,
        ),
        Ok(response) => {
            let failure = DeliveryError::Status {
                status: response.status,
                body: response.body.clone(),
            };
            (
                CallOutcome {
                    status: CallStatus::Failed,
                    response_status: Some(i32::from(response.status)),
                    response_body: response.body,
                    error_message: Some(failure.to_string()),
                    duration_ms,
                },
                Some(failure),
            )
        }
        Err(failure) => (
            CallOutcome {
                status: CallStatus::Failed,
                response_status: None,
                response_body: None,
                error_message: Some(failure.to_string()),
                duration_ms,
            },
            Some(failure),
        ),
    }
}
