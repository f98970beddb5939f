// ============================================================================
// Account Routes
// ============================================================================
//
// Endpoints:
// - GET    /api/v1/account     - Current user's profile
// - DELETE /api/v1/account     - Delete account (sensitive rate class)
// - GET    /api/v1/admin/users - List accounts (admin only)
//
// ============================================================================

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tally_error::ApiError;
use uuid::Uuid;

use crate::context::AppContext;
use crate::response::ApiResponse;
use crate::routes::extractors::CurrentUser;
use crate::users::{Role, UserRecord};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
}

impl From<&UserRecord> for AccountResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
        }
    }
}

/// GET /api/v1/account
pub async fn get_account(user: CurrentUser) -> impl IntoResponse {
    let user = user.0;
    Json(ApiResponse::new(AccountResponse {
        user_id: user.id,
        email: user.email,
        display_name: user.display_name,
        role: user.role,
    }))
}

/// DELETE /api/v1/account
///
/// Removes the account and everything it owns in the ledger.
pub async fn delete_account(
    State(context): State<Arc<AppContext>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = user.0;
    let user_id = Uuid::parse_str(&user.id)
        .map_err(|_| ApiError::internal("Invalid user ID in token"))?;

    let removed = context.users.delete_user(user_id).await?;
    if !removed {
        return Err(ApiError::not_found("Account not found"));
    }

    context.ledger.purge_owner(&user.id).await?;

    tracing::info!(user_id = %user.id, "Account deleted");
    Ok(Json(ApiResponse::new(json!({ "deleted": true }))))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(context): State<Arc<AppContext>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    if user.0.role != Role::Admin {
        tracing::warn!(user_id = %user.0.id, "Admin route denied for non-admin");
        return Err(ApiError::authorization("Administrator access required"));
    }

    let users = context.users.list_users().await?;
    let accounts: Vec<AccountResponse> = users.iter().map(AccountResponse::from).collect();
    Ok(Json(ApiResponse::new(accounts)))
}
