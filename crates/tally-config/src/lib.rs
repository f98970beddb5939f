// ============================================================================
// Tally Config - Centralized configuration management
// ============================================================================
//
// This crate provides centralized configuration for Tally services.
// Supports loading from environment variables with sensible defaults.
//
// ============================================================================

mod constants;
mod environment;
mod security;

pub use constants::{MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND};
pub use environment::Environment;
pub use security::{RateLimitPolicy, SecurityConfig};

use anyhow::Result;
use constants::*;

/// Main configuration structure for Tally services
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,

    /// Symmetric secret for JWT signing and verification (HS256).
    /// Must be non-empty; the auth manager refuses to start without it.
    pub jwt_secret: String,
    pub jwt_issuer: String,

    /// Access token TTL in hours
    pub access_token_ttl_hours: i64,

    /// Log filter directive for tracing (RUST_LOG syntax)
    pub rust_log: String,

    pub security: SecurityConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            jwt_issuer: std::env::var("JWT_ISSUER")
                .unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            access_token_ttl_hours: std::env::var("ACCESS_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_HOURS),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.to_string()),
            security: SecurityConfig::from_env(),
        })
    }
}
