// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// - webhook_worker：投递分发器
/// - manager：分发器工作池与关闭流程
/// - expiration_worker：卡住尝试的回收
pub mod expiration_worker;
pub mod manager;
pub mod webhook_worker;
