// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::utils::errors::WebhookError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<WebhookError>() {
            Some(WebhookError::QuotaExceeded { .. }) => StatusCode::CONFLICT,
            Some(WebhookError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(WebhookError::InvalidTransition { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(WebhookError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(WebhookError::Repository(_)) | Some(WebhookError::Queue(_)) | None => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
