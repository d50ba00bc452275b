// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 持久化的投递尝试队列，负责入队、领取与关闭
pub mod delivery_queue;
