// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 数据传输对象与服务组装
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供数据库、出站HTTP和指标导出的具体实现
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和提取器
pub mod presentation;

/// 队列模块
///
/// 投递尝试的入队、领取与关闭
pub mod queue;

/// 工具模块
///
/// 错误类型、重试策略与日志初始化
pub mod utils;

/// 工作器模块
///
/// 投递分发器、工作池与卡住尝试回收
pub mod workers;
