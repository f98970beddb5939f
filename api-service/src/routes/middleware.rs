// ============================================================================
// Gate Middleware
// ============================================================================
//
// The request gate every API call passes through, in order:
// - request logging (assigns x-request-id, logs outcome + latency)
// - rate limiting (fixed window, keyed per route class)
// - authentication (bearer JWT, attaches AuthenticatedUser)
//
// Failures short-circuit with the uniform error envelope; handlers
// never see a request that failed the gate.
//
// ============================================================================

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tally_error::ApiError;
use uuid::Uuid;

use crate::context::AppContext;
use crate::rate_limit::{parse_window, RouteClass};
use crate::utils::extract_client_ip;

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Assign a request id and log method, path, status and latency.
pub async fn request_logging(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string();

    // Always overwrite to prevent injected ids from upstream.
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(HeaderName::from_static(HEADER_REQUEST_ID), value);
    }

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

/// Fixed-window rate limiting, applied before authentication.
///
/// Auth routes key on the client IP; other routes key on the user id
/// from a verifiable bearer token when one is present, else the IP.
pub async fn rate_limiting(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();
    if path.starts_with("/health") {
        return Ok(next.run(request).await);
    }

    let class = RouteClass::classify(request.method(), &path);
    let client_ip = extract_client_ip(request.headers(), None);
    let identity = match class {
        RouteClass::Auth => client_ip,
        _ => bearer_token(request.headers())
            .and_then(|token| context.auth_manager.verify_token(token).ok())
            .map(|claims| claims.sub)
            .filter(|sub| !sub.trim().is_empty())
            .unwrap_or(client_ip),
    };

    let policy = class.policy(&context.config.security);
    let window_ms = parse_window(&policy.window);
    let key = format!("{}:{}", class.as_str(), identity);

    let decision = context.rate_limiter.check(&key, policy.max, window_ms).await;
    if !decision.allowed {
        tracing::warn!(
            key = %key,
            limit = policy.max,
            reset_at = decision.reset_at,
            path = %path,
            "Rate limit exceeded"
        );
        return Err(ApiError::rate_limit(
            "Too many requests. Please try again later.",
        ));
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), policy.max, decision.remaining, decision.reset_at);
    Ok(response)
}

/// The authentication gate for protected routes.
///
/// Public endpoints pass through untouched. Everything else requires
/// a bearer token; on success the AuthenticatedUser is attached to
/// request extensions for handlers and extractors downstream.
pub async fn require_auth(
    State(context): State<Arc<AppContext>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();
    if is_public_endpoint(&path) {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(path = %path, "Missing Authorization header");
            ApiError::authentication("Authentication required")
        })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!(path = %path, "Invalid Authorization header format");
        ApiError::authentication("Invalid or expired token")
    })?;

    let user = context.auth_manager.authenticate(token)?;

    tracing::debug!(user_id = %user.id, path = %path, "Request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Endpoints reachable without a token
fn is_public_endpoint(path: &str) -> bool {
    matches!(
        path,
        "/api/v1/auth/register" | "/api/v1/auth/login" | "/health"
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, max: u32, remaining: u32, reset_at: i64) {
    let pairs = [
        ("x-ratelimit-limit", max.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
        ("x-ratelimit-reset", reset_at.to_string()),
    ];
    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}
