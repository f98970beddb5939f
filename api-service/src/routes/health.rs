// ============================================================================
// Health Check
// ============================================================================

use axum::{response::IntoResponse, Json};
use serde_json::json;

/// GET /health
///
/// Exempt from the gate: no auth, no rate limiting.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
