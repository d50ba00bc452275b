// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::delivery_response::PublishEventResponseDto;
use crate::application::dto::webhook_request::PublishEventRequestDto;
use crate::domain::use_cases::publish_event::PublishEventUseCase;
use crate::infrastructure::metrics::DELIVERIES_ENQUEUED_TOTAL;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::team_id::TeamId;
use axum::{http::StatusCode, Extension, Json};
use metrics::counter;
use std::sync::Arc;

/// 发布领域事件
pub async fn publish_event(
    TeamId(team_id): TeamId,
    Extension(use_case): Extension<Arc<PublishEventUseCase>>,
    Json(payload): Json<PublishEventRequestDto>,
) -> Result<(StatusCode, Json<PublishEventResponseDto>), AppError> {
    let (event_type, attempts) = use_case.execute(team_id, payload).await?;
    counter!(DELIVERIES_ENQUEUED_TOTAL, "event_type" => event_type.as_str())
        .increment(attempts.len() as u64);

    let body = PublishEventResponseDto {
        event_type,
        deliveries: attempts.into_iter().map(Into::into).collect(),
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}
