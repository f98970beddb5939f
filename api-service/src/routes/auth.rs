// ============================================================================
// Authentication Routes
// ============================================================================
//
// Endpoints:
// - POST /api/v1/auth/register - Create an account, issue a token
// - POST /api/v1/auth/login    - Verify credentials, issue a token
//
// Both are public and rate limited per IP (auth route class).
//
// ============================================================================

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tally_error::{ApiError, ValidationDetails};

use crate::context::AppContext;
use crate::response::ApiResponse;
use crate::users::{NewUser, Role, UserRecord};

/// Request body for POST /api/v1/auth/register
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request body for POST /api/v1/auth/login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for both register and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
    pub access_token: String,
    /// Token expiry, Unix epoch seconds
    pub expires_at: i64,
}

impl AuthResponse {
    fn new(user: &UserRecord, access_token: String, expires_at: i64) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            access_token,
            expires_at,
        }
    }
}

/// POST /api/v1/auth/register
pub async fn register(
    State(context): State<Arc<AppContext>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    validate_register(&request)?;

    let user = context
        .users
        .create_user(NewUser {
            email: request.email,
            password: request.password,
            display_name: request.display_name,
            role: Role::User,
        })
        .await?;

    let (access_token, expires_at) = context.auth_manager.create_token(&user)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(AuthResponse::new(
            &user,
            access_token,
            expires_at,
        ))),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(context): State<Arc<AppContext>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    validate_login(&request)?;

    let user = context
        .users
        .verify_credentials(&request.email, &request.password)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login failed: invalid credentials");
            ApiError::authentication("Invalid email or password")
        })?;

    let (access_token, expires_at) = context.auth_manager.create_token(&user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(AuthResponse::new(
            &user,
            access_token,
            expires_at,
        ))),
    ))
}

fn validate_register(request: &RegisterRequest) -> Result<(), ApiError> {
    let mut details = ValidationDetails::new();

    let email = request.email.trim();
    if email.is_empty() {
        field(&mut details, "email", "is required");
    } else if !email.contains('@') {
        field(&mut details, "email", "must be a valid email address");
    }

    if request.password.len() < 8 {
        field(&mut details, "password", "must be at least 8 characters");
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_with("Invalid registration input", details))
    }
}

fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    let mut details = ValidationDetails::new();

    if request.email.trim().is_empty() {
        field(&mut details, "email", "is required");
    }
    if request.password.is_empty() {
        field(&mut details, "password", "is required");
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_with("Invalid login input", details))
    }
}

fn field(details: &mut ValidationDetails, name: &str, message: &str) {
    details
        .entry(name.to_string())
        .or_default()
        .push(message.to_string());
}
