// ============================================================================
// Router
// ============================================================================
//
// Wires routes and the gate. Layer order matters:
// - require_auth is a route_layer, so unmatched paths fall through to
//   the 404 fallback instead of failing auth first
// - rate_limiting wraps everything, including the fallback
// - tracing + request logging are outermost
//
// ============================================================================

use axum::{
    http::{Method, Uri},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tally_error::ApiError;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

pub mod account;
pub mod auth;
pub mod extractors;
pub mod health;
pub mod middleware;
pub mod transactions;

pub fn create_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route(
            "/api/v1/account",
            get(account::get_account).delete(account::delete_account),
        )
        .route("/api/v1/admin/users", get(account::list_users))
        .route(
            "/api/v1/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/api/v1/transactions/:id",
            get(transactions::get_transaction).delete(transactions::delete_transaction),
        )
        .route_layer(from_fn_with_state(
            context.clone(),
            middleware::require_auth,
        ))
        .fallback(not_found)
        .layer(from_fn_with_state(context.clone(), middleware::rate_limiting))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(middleware::request_logging)),
        )
        .with_state(context)
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} {} not found", method, uri.path()))
}
