// ============================================================================
// Configuration Constants
// ============================================================================

// Default server binding
pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

// Default token lifetime
pub(crate) const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;

pub(crate) const DEFAULT_JWT_ISSUER: &str = "tally-api";

pub(crate) const DEFAULT_RUST_LOG: &str = "info";

// Rate-limit policy defaults per route class.
// Auth routes are throttled hard per-IP to slow brute-force attempts
// before identity is known; general traffic gets a wider window.
pub(crate) const DEFAULT_AUTH_RATE_MAX: u32 = 5;
pub(crate) const DEFAULT_AUTH_RATE_WINDOW: &str = "15 minutes";
pub(crate) const DEFAULT_GENERAL_RATE_MAX: u32 = 100;
pub(crate) const DEFAULT_GENERAL_RATE_WINDOW: &str = "1 minute";
pub(crate) const DEFAULT_SENSITIVE_RATE_MAX: u32 = 10;
pub(crate) const DEFAULT_SENSITIVE_RATE_WINDOW: &str = "1 minute";

// Time conversion constants
pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
