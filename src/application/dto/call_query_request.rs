// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 调用历史查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CallQueryRequestDto {
    pub webhook_id: Option<Uuid>,
    /// pending | success | failed
    pub status: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u64>,
    pub cursor: Option<Uuid>,
}
