// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// - webhook_handler：订阅生命周期与手动测试
/// - call_handler：调用历史与手动重试
/// - event_handler：事件发布
pub mod call_handler;
pub mod event_handler;
pub mod webhook_handler;
