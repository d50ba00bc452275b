// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的 SeaORM 实现与进程内实现
pub mod call_record_repo_impl;
pub mod delivery_attempt_repo_impl;
pub mod memory;
pub mod webhook_repo_impl;
