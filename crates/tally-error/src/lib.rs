use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::collections::BTreeMap;
use tally_config::Environment;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Per-field validation messages attached to a validation failure
pub type ValidationDetails = BTreeMap<String, Vec<String>>;

/// Application error type for Tally services
///
/// A tagged variant per failure kind so the normalizer can match
/// exhaustively. Every variant maps to exactly one HTTP status and
/// stable error code; the mapping lives here and nowhere else.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<ValidationDetails>,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) | ApiError::Jwt(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the stable error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Authentication(_) | ApiError::Jwt(_) => "AUTHENTICATION_ERROR",
            ApiError::Authorization(_) => "AUTHORIZATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::RateLimit(_) => "RATE_LIMIT",
            ApiError::Internal(_) | ApiError::Unknown(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the client-facing message for the current runtime mode
    pub fn user_message(&self) -> String {
        self.user_message_for(Environment::current())
    }

    /// Client-facing message. Internal error text is exposed only in
    /// development mode; token-verification internals are never exposed.
    pub fn user_message_for(&self, env: Environment) -> String {
        match self {
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Authentication(msg) => msg.clone(),
            ApiError::Authorization(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::RateLimit(msg) => msg.clone(),
            ApiError::Jwt(_) => "Invalid or expired token".to_string(),
            ApiError::Internal(_) | ApiError::Unknown(_) => {
                if env.is_development() {
                    self.to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
        }
    }

    /// Validation details, if any
    pub fn details(&self) -> Option<&ValidationDetails> {
        match self {
            ApiError::Validation { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Log this error with a level appropriate to its severity
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Authentication failed"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }
}

// ============================================================================
// Helper constructors
// ============================================================================

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation {
            message: msg.into(),
            details: None,
        }
    }

    pub fn validation_with(msg: impl Into<String>, details: ValidationDetails) -> Self {
        ApiError::Validation {
            message: msg.into(),
            details: Some(details),
        }
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        ApiError::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        ApiError::Authorization(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn rate_limit(msg: impl Into<String>) -> Self {
        ApiError::RateLimit(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }
}

// Malformed or unparseable JSON bodies surface as validation failures
// so the client always sees the uniform envelope.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let mut details = ValidationDetails::new();
        details.insert("body".to_string(), vec![rejection.body_text()]);
        ApiError::Validation {
            message: "Invalid request body".to_string(),
            details: Some(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let mut error = json!({
            "code": self.error_code(),
            "message": self.user_message(),
        });
        if let Some(details) = self.details() {
            error["details"] = json!(details);
        }

        let body = json!({
            "success": false,
            "error": error,
        });

        (status, axum::Json(body)).into_response()
    }
}
