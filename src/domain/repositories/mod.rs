// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义订阅、投递尝试和调用记录的数据访问抽象
pub mod call_record_repository;
pub mod delivery_attempt_repository;
pub mod webhook_repository;
