// ============================================================================
// Rate Limiting Module
// ============================================================================
//
// Fixed-window per-key request counters behind an injectable store
// interface, so a multi-process deployment can swap in a shared
// counter backend without touching call sites.
//
// Key layout: "{class}:{identity}". Authentication routes key on the
// client IP (identity is not known yet); general and sensitive routes
// key on the authenticated user id when present, else the IP.
//
// No background eviction: stale records stay in memory until a later
// request to the same key overwrites them.
//
// ============================================================================

use async_trait::async_trait;
use axum::http::Method;
use chrono::Utc;
use std::collections::HashMap;
use tally_config::{RateLimitPolicy, SecurityConfig, MILLIS_PER_DAY, MILLIS_PER_HOUR,
    MILLIS_PER_MINUTE, MILLIS_PER_SECOND};
use tokio::sync::Mutex;

/// Fallback window when a policy string cannot be parsed
const DEFAULT_WINDOW_MS: i64 = 60 * MILLIS_PER_SECOND;

/// Outcome of a rate-limit check for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Window end, epoch milliseconds
    pub reset_at: i64,
}

/// One counter per (class, identity) pair. Replaced, never merged,
/// once the window has elapsed.
#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_at: i64,
}

/// Route classes with distinct rate-limit policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login/register - throttled per IP before identity is known
    Auth,
    /// Everything else
    Default,
    /// Destructive account operations
    Sensitive,
}

impl RouteClass {
    /// Key prefix for this class
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Default => "default",
            Self::Sensitive => "sensitive",
        }
    }

    /// Classify a request by method and path
    pub fn classify(method: &Method, path: &str) -> Self {
        if path.starts_with("/api/v1/auth/") {
            Self::Auth
        } else if *method == Method::DELETE && path == "/api/v1/account" {
            Self::Sensitive
        } else {
            Self::Default
        }
    }

    /// Policy configured for this class
    pub fn policy<'a>(&self, security: &'a SecurityConfig) -> &'a RateLimitPolicy {
        match self {
            Self::Auth => &security.auth_rate_limit,
            Self::Default => &security.general_rate_limit,
            Self::Sensitive => &security.sensitive_rate_limit,
        }
    }
}

/// Parse a window string like "15 minutes" into milliseconds.
///
/// Unrecognized formats fall back to a 60-second window. The fallback
/// is policy, not an error, so no diagnostic is emitted.
pub fn parse_window(window: &str) -> i64 {
    let mut parts = window.split_whitespace();
    let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return DEFAULT_WINDOW_MS;
    };

    let Ok(amount) = amount.parse::<i64>() else {
        return DEFAULT_WINDOW_MS;
    };
    if amount <= 0 {
        return DEFAULT_WINDOW_MS;
    }

    let per_unit = match unit.to_ascii_lowercase().as_str() {
        "ms" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => MILLIS_PER_SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MILLIS_PER_MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => MILLIS_PER_HOUR,
        "d" | "day" | "days" => MILLIS_PER_DAY,
        _ => return DEFAULT_WINDOW_MS,
    };

    amount.saturating_mul(per_unit)
}

/// Store interface for fixed-window counters.
///
/// The in-memory implementation below is single-process only; a
/// shared backend (e.g. a central counter store) can be swapped in
/// behind this trait for multi-process deployments.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one request against `key` and decide whether it may proceed.
    async fn check(&self, key: &str, max: u32, window_ms: i64) -> RateLimitDecision;
}

/// In-memory fixed-window store.
///
/// The map is shared mutable state across all in-flight requests; the
/// mutex makes each per-key read-modify-write atomic so concurrent
/// increments to the same key are never lost.
pub struct InMemoryRateLimitStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Check against an explicit clock, for deterministic tests.
    pub async fn check_at(&self, key: &str, max: u32, window_ms: i64, now_ms: i64) -> RateLimitDecision {
        let mut records = self.records.lock().await;

        match records.get_mut(key) {
            Some(record) if now_ms <= record.reset_at => {
                if record.count < max {
                    record.count += 1;
                    RateLimitDecision {
                        allowed: true,
                        remaining: max - record.count,
                        reset_at: record.reset_at,
                    }
                } else {
                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: record.reset_at,
                    }
                }
            }
            _ => {
                // First request for this key, or the stored window has
                // elapsed: replace the record outright.
                let record = RateLimitRecord {
                    count: 1,
                    reset_at: now_ms + window_ms,
                };
                records.insert(key.to_string(), record);
                RateLimitDecision {
                    allowed: max >= 1,
                    remaining: max.saturating_sub(1),
                    reset_at: record.reset_at,
                }
            }
        }
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn check(&self, key: &str, max: u32, window_ms: i64) -> RateLimitDecision {
        self.check_at(key, max, window_ms, Utc::now().timestamp_millis())
            .await
    }
}
