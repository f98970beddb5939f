// ============================================================================
// Security Configuration
// ============================================================================
//
// Rate-limit policies per route class. Windows are human-readable
// strings ("15 minutes", "1 minute") parsed by the rate limiter; an
// unrecognized window silently falls back to 60 seconds.
//
// ============================================================================

use crate::constants::*;

/// A single fixed-window rate-limit policy
#[derive(Clone, Debug)]
pub struct RateLimitPolicy {
    /// Maximum requests per window
    pub max: u32,
    /// Window length as a human-readable string, e.g. "15 minutes"
    pub window: String,
}

/// Security-related configuration for the API gate
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// Policy for authentication routes (login/register), keyed per IP
    pub auth_rate_limit: RateLimitPolicy,
    /// Policy for general routes, keyed per user when authenticated
    pub general_rate_limit: RateLimitPolicy,
    /// Policy for sensitive routes (e.g. account deletion)
    pub sensitive_rate_limit: RateLimitPolicy,
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl SecurityConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            auth_rate_limit: RateLimitPolicy {
                max: env_u32("RATE_LIMIT_AUTH_MAX", DEFAULT_AUTH_RATE_MAX),
                window: env_string("RATE_LIMIT_AUTH_WINDOW", DEFAULT_AUTH_RATE_WINDOW),
            },
            general_rate_limit: RateLimitPolicy {
                max: env_u32("RATE_LIMIT_GENERAL_MAX", DEFAULT_GENERAL_RATE_MAX),
                window: env_string("RATE_LIMIT_GENERAL_WINDOW", DEFAULT_GENERAL_RATE_WINDOW),
            },
            sensitive_rate_limit: RateLimitPolicy {
                max: env_u32("RATE_LIMIT_SENSITIVE_MAX", DEFAULT_SENSITIVE_RATE_MAX),
                window: env_string("RATE_LIMIT_SENSITIVE_WINDOW", DEFAULT_SENSITIVE_RATE_WINDOW),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecurityConfig::from_env();
        assert_eq!(config.auth_rate_limit.max, DEFAULT_AUTH_RATE_MAX);
        assert_eq!(config.auth_rate_limit.window, DEFAULT_AUTH_RATE_WINDOW);
        assert_eq!(config.general_rate_limit.max, DEFAULT_GENERAL_RATE_MAX);
        assert_eq!(config.sensitive_rate_limit.max, DEFAULT_SENSITIVE_RATE_MAX);
    }
}
