// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：订阅、投递尝试与调用记录
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：签名、订阅注册表、调用账本与发送路径
/// - 用例（use_cases）：事件发布、手动测试与手动重试
///
/// 领域层不依赖于任何具体的存储或传输实现。
pub mod models;
pub mod repositories;
pub mod services;
pub mod use_cases;
