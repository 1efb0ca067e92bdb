//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取功能。边缘部署永远位于反向代理之后，
//! 因此优先信任 X-Forwarded-For 的第一个逗号分隔段。

use actix_web::http::header::HeaderMap;
use actix_web::HttpRequest;

/// 从 HttpRequest 提取客户端 IP
///
/// 优先级：X-Forwarded-For 第一段 → socket 对端地址 → "unknown"
pub fn client_ip(req: &HttpRequest) -> String {
    forwarded_ip_from_headers(req.headers())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// 从 HeaderMap 提取转发的 IP（X-Forwarded-For 第一段，即原始客户端 IP）
pub fn forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
