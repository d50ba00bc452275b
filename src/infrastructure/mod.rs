// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 依赖领域层的抽象接口，提供具体技术实现：
/// - 数据库（database）：连接池、迁移和实体映射
/// - 指标（metrics）：Prometheus 导出与指标名
/// - 仓库实现（repositories）：SeaORM 与进程内两套仓库
/// - 服务（services）：基于 reqwest 的出站投递
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod services;
