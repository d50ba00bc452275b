// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - signer：请求签名与密钥生成
/// - subscription_registry：订阅的解析与生命周期管理
/// - call_ledger：调用历史的记录与查询
/// - delivery_executor：签名、发送并记账的共用发送路径
/// - webhook_service：出站传输抽象
pub mod call_ledger;
pub mod delivery_executor;
pub mod signer;
pub mod subscription_registry;
pub mod webhook_service;
