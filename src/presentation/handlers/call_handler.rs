// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::call_query_request::CallQueryRequestDto;
use crate::application::dto::delivery_response::DeliveryAcceptedDto;
use crate::domain::models::call_record::{CallPage, CallRecord};
use crate::domain::services::call_ledger::CallLedger;
use crate::domain::use_cases::retry_call::RetryCallUseCase;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::team_id::TeamId;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 分页列出调用历史
pub async fn list_calls(
    TeamId(team_id): TeamId,
    Query(query): Query<CallQueryRequestDto>,
    Extension(ledger): Extension<CallLedger>,
) -> Result<Json<CallPage>, AppError> {
    let page = ledger.list(team_id, query).await?;
    Ok(Json(page))
}

pub async fn get_call(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(ledger): Extension<CallLedger>,
) -> Result<Json<CallRecord>, AppError> {
    let record = ledger.get(id, team_id).await?;
    Ok(Json(record))
}

/// 用原始负载重新入队
pub async fn retry_call(
    TeamId(team_id): TeamId,
    Path(id): Path<Uuid>,
    Extension(use_case): Extension<Arc<RetryCallUseCase>>,
) -> Result<(StatusCode, Json<DeliveryAcceptedDto>), AppError> {
    let attempt = use_case.execute(id, team_id).await?;
    Ok((StatusCode::ACCEPTED, Json(attempt.into())))
}
