// ============================================================================
// Runtime Environment
// ============================================================================
//
// Development vs. production mode. Controls how much internal error
// detail is exposed to clients: real messages in development, generic
// strings in production.
//
// ============================================================================

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

static CURRENT: OnceLock<Environment> = OnceLock::new();

impl Environment {
    /// Parse an environment name. Anything other than "production"/"prod"
    /// is treated as development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Process-wide runtime mode, read from `APP_ENV` once and cached.
    pub fn current() -> Self {
        *CURRENT.get_or_init(|| {
            std::env::var("APP_ENV")
                .map(|v| Environment::from_name(&v))
                .unwrap_or(Environment::Development)
        })
    }

    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_names() {
        assert_eq!(Environment::from_name("production"), Environment::Production);
        assert_eq!(Environment::from_name("PROD"), Environment::Production);
    }

    #[test]
    fn test_everything_else_is_development() {
        assert_eq!(Environment::from_name("development"), Environment::Development);
        assert_eq!(Environment::from_name("staging"), Environment::Development);
        assert_eq!(Environment::from_name(""), Environment::Development);
    }
}
