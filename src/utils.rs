use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::net::IpAddr;

/// Extracts the client IP address from HTTP request headers.
///
/// Checks headers in order of priority:
/// 1. X-Forwarded-For (first IP in the chain, if present)
/// 2. X-Real-IP (single IP, if present)
/// 3. Falls back to the provided direct connection IP
///
/// X-Forwarded-For can be spoofed by clients; in production the reverse
/// proxy must set these headers and strip any existing X-Forwarded-For from
/// untrusted sources.
pub fn extract_client_ip(headers: &axum::http::HeaderMap, direct_ip: Option<IpAddr>) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            // "client, proxy1, proxy2" - the first entry is the original client.
            let first_ip = forwarded_str.split(',').next().unwrap_or("").trim();
            if let Ok(ip) = first_ip.parse::<IpAddr>() {
                return normalize_ip(ip);
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            if let Ok(ip) = real_ip_str.trim().parse::<IpAddr>() {
                return normalize_ip(ip);
            }
        }
    }

    if let Some(ip) = direct_ip {
        return normalize_ip(ip);
    }

    "unknown".to_string()
}

/// Inserts a numeric header, used for the rate-limit telemetry headers.
/// Header names must be lowercase static strings.
pub fn insert_numeric_header(headers: &mut HeaderMap, name: &'static str, value: i64) {
    if let Ok(header_value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), header_value);
    }
}

/// Normalizes an IP address to string form (removes brackets for IPv6).
fn normalize_ip(ip: IpAddr) -> String {
    ip.to_string()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string()
}
