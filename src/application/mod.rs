// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用层模块
///
/// 包含 HTTP 边界上的数据传输对象，以及把仓库、队列、
/// 用例与工作器组装在一起的服务集合
pub mod dto;
pub mod services;
