// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 使用SeaORM框架定义订阅、投递尝试和调用记录三张表
pub mod delivery_attempt;
pub mod sea_orm_active_enums;
pub mod webhook;
pub mod webhook_call;
