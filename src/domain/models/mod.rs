// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了投递引擎的核心业务实体，包括：
/// - 订阅（webhook）：团队注册的回调端点及其事件类型
/// - 投递尝试（delivery）：队列中的单次投递或重试
/// - 调用记录（call_record）：每次执行的审计条目
pub mod call_record;
pub mod delivery;
pub mod webhook;
