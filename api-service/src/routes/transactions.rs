// ============================================================================
// Transaction Routes
// ============================================================================
//
// Endpoints:
// - GET    /api/v1/transactions     - List (paginated)
// - POST   /api/v1/transactions     - Create
// - GET    /api/v1/transactions/:id - Fetch one
// - DELETE /api/v1/transactions/:id - Delete one
//
// All authenticated; every operation is scoped to the current user.
//
// ============================================================================

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tally_error::{ApiError, ValidationDetails};
use uuid::Uuid;

use crate::context::AppContext;
use crate::ledger::NewTransaction;
use crate::response::{ApiResponse, Meta};
use crate::routes::extractors::CurrentUser;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

/// GET /api/v1/transactions
pub async fn list_transactions(
    State(context): State<Arc<AppContext>>,
    user: CurrentUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(pagination) = query
        .map_err(|e| ApiError::validation(format!("Invalid pagination: {}", e.body_text())))?;

    let page = pagination.page.max(1);
    let page_size = pagination.page_size.clamp(1, MAX_PAGE_SIZE);

    let (transactions, total) = context.ledger.list(&user.0.id, page, page_size).await?;

    Ok(Json(ApiResponse::with_meta(
        transactions,
        Meta::new(page, page_size, total),
    )))
}

/// POST /api/v1/transactions
pub async fn create_transaction(
    State(context): State<Arc<AppContext>>,
    user: CurrentUser,
    body: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    validate_new_transaction(&request)?;

    let transaction = context.ledger.create(&user.0.id, request).await?;

    tracing::debug!(
        user_id = %user.0.id,
        transaction_id = %transaction.id,
        "Transaction created"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::new(transaction))))
}

/// GET /api/v1/transactions/:id
pub async fn get_transaction(
    State(context): State<Arc<AppContext>>,
    user: CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id
        .map_err(|e| ApiError::validation(format!("Invalid transaction id: {}", e.body_text())))?;

    let transaction = context
        .ledger
        .get(&user.0.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Transaction {} not found", id)))?;

    Ok(Json(ApiResponse::new(transaction)))
}

/// DELETE /api/v1/transactions/:id
pub async fn delete_transaction(
    State(context): State<Arc<AppContext>>,
    user: CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id
        .map_err(|e| ApiError::validation(format!("Invalid transaction id: {}", e.body_text())))?;

    let removed = context.ledger.delete(&user.0.id, id).await?;
    if !removed {
        return Err(ApiError::not_found(format!("Transaction {} not found", id)));
    }

    Ok(Json(ApiResponse::new(json!({ "deleted": true }))))
}

fn validate_new_transaction(request: &NewTransaction) -> Result<(), ApiError> {
    let mut details = ValidationDetails::new();

    if request.amount_cents == 0 {
        field(&mut details, "amountCents", "must be non-zero");
    }

    let currency = request.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        field(&mut details, "currency", "must be a 3-letter currency code");
    }

    if request.category.trim().is_empty() {
        field(&mut details, "category", "is required");
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_with("Invalid transaction input", details))
    }
}

fn field(details: &mut ValidationDetails, name: &str, message: &str) {
    details
        .entry(name.to_string())
        .or_default()
        .push(message.to_string());
}
