// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::services::WebhookServices;
use crate::presentation::handlers::{call_handler, event_handler, webhook_handler};
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `services` - 组装好的服务
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(services: &WebhookServices) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let webhook_routes = Router::new()
        .route(
            "/v1/webhooks",
            post(webhook_handler::create_webhook).get(webhook_handler::list_webhooks),
        )
        .route(
            "/v1/webhooks/{id}",
            get(webhook_handler::get_webhook)
                .patch(webhook_handler::update_webhook)
                .delete(webhook_handler::delete_webhook),
        )
        .route(
            "/v1/webhooks/{id}/status",
            put(webhook_handler::set_webhook_status),
        )
        .route(
            "/v1/webhooks/{id}/rotate-secret",
            post(webhook_handler::rotate_secret),
        )
        .route("/v1/webhooks/{id}/test", post(webhook_handler::test_webhook))
        .route("/v1/events", post(event_handler::publish_event))
        .route("/v1/webhook-calls", get(call_handler::list_calls))
        .route("/v1/webhook-calls/{id}", get(call_handler::get_call))
        .route(
            "/v1/webhook-calls/{id}/retry",
            post(call_handler::retry_call),
        )
        .layer(Extension(services.registry.clone()))
        .layer(Extension(services.ledger.clone()))
        .layer(Extension(services.publish_event.clone()))
        .layer(Extension(services.test_webhook.clone()))
        .layer(Extension(services.retry_call.clone()));

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
