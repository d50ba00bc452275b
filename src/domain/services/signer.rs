// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 请求签名
//!
//! 签名为 `hex(HMAC-SHA256(secret, "{timestamp}.{body}"))`。
//! 接收方用同样的方式重新计算，并在常量时间内比较。

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 签名请求头
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
/// 时间戳请求头（Unix 秒）
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
/// 事件类型请求头
pub const EVENT_HEADER: &str = "X-Webhook-Event";
/// 调用记录ID请求头，可用于接收方去重
pub const CALL_ID_HEADER: &str = "X-Webhook-Id";

/// 生成的密钥前缀
pub const SECRET_PREFIX: &str = "whsec_";
/// 密钥随机字节数
pub const SECRET_BYTES: usize = 32;

/// 为负载生成签名
pub fn sign(secret: &str, payload: &[u8], timestamp: i64) -> String {
    hex::encode(mac_for(secret, payload, timestamp).finalize().into_bytes())
}

/// 校验签名，比较在常量时间内完成
pub fn verify(secret: &str, payload: &[u8], timestamp: i64, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    mac_for(secret, payload, timestamp)
        .verify_slice(&expected)
        .is_ok()
}

fn mac_for(secret: &str, payload: &[u8], timestamp: i64) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// 生成新的订阅密钥
///
/// 32 字节随机数（线程本地 CSPRNG，由操作系统熵源播种），
/// URL 安全的 base64 编码并加上 `whsec_` 前缀
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}{}", SECRET_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}
