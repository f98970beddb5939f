use std::net::IpAddr;

/// Extracts the client IP address from request headers.
///
/// Checks X-Forwarded-For (first hop) then X-Real-IP, falling back to
/// the direct connection address. Forwarded headers are spoofable, so
/// they must only be trusted behind a reverse proxy that sets them.
pub fn extract_client_ip(headers: &axum::http::HeaderMap, direct_ip: Option<IpAddr>) -> String {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        // May contain a chain "client, proxy1, proxy2"; the first
        // entry is the original client.
        let first = value.split(',').next().unwrap_or("").trim();
        if let Ok(ip) = first.parse::<IpAddr>() {
            return ip.to_string();
        }
    }

    if let Some(value) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if let Ok(ip) = value.trim().parse::<IpAddr>() {
            return ip.to_string();
        }
    }

    match direct_ip {
        Some(ip) => ip.to_string(),
        None => "unknown".to_string(),
    }
}
