// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 组合注册表、队列与执行器完成的业务操作
pub mod publish_event;
pub mod retry_call;
pub mod test_webhook;
