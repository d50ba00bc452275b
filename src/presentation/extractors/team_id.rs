// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::PlanTier;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

/// 团队ID请求头
pub const TEAM_ID_HEADER: &str = "X-Team-Id";
/// 套餐请求头，由上游网关写入
pub const TEAM_PLAN_HEADER: &str = "X-Team-Plan";

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// 调用方所属团队
#[derive(Debug, Clone, Copy)]
pub struct TeamId(pub Uuid);

impl<S> FromRequestParts<S> for TeamId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TEAM_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(TeamId)
            .ok_or_else(|| bad_request("Missing or invalid X-Team-Id header"))
    }
}

/// 调用方团队的套餐等级，缺省为免费套餐
#[derive(Debug, Clone, Copy)]
pub struct TeamPlan(pub PlanTier);

impl<S> FromRequestParts<S> for TeamPlan
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(TEAM_PLAN_HEADER) else {
            return Ok(TeamPlan(PlanTier::default()));
        };

        match value.to_str().map(|v| v.trim().to_ascii_lowercase()) {
            Ok(plan) if plan == "free" => Ok(TeamPlan(PlanTier::Free)),
            Ok(plan) if plan == "paid" => Ok(TeamPlan(PlanTier::Paid)),
            _ => Err(bad_request("Invalid X-Team-Plan header")),
        }
    }
}
