// ============================================================================
// Gate Integration Tests
// ============================================================================
//
// Drives the full router through tower::ServiceExt::oneshot: rate
// limiting, authentication, error envelope and the route handlers
// behind them.
//
// ============================================================================

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tally_config::{Config, RateLimitPolicy, SecurityConfig};
use tower::ServiceExt;
use uuid::Uuid;

use tally_api::auth::{AuthManager, Claims};
use tally_api::context::AppContext;
use tally_api::ledger::InMemoryLedger;
use tally_api::rate_limit::InMemoryRateLimitStore;
use tally_api::routes::create_router;
use tally_api::users::InMemoryUserDirectory;

const TEST_SECRET: &str = "integration-test-secret";
const TEST_ISSUER: &str = "tally-test";

fn test_config() -> Config {
    Config {
        port: 0,
        bind_address: "127.0.0.1".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_issuer: TEST_ISSUER.to_string(),
        access_token_ttl_hours: 1,
        rust_log: "warn".to_string(),
        security: SecurityConfig {
            auth_rate_limit: RateLimitPolicy {
                max: 5,
                window: "15 minutes".to_string(),
            },
            general_rate_limit: RateLimitPolicy {
                max: 100,
                window: "1 minute".to_string(),
            },
            sensitive_rate_limit: RateLimitPolicy {
                max: 10,
                window: "1 minute".to_string(),
            },
        },
    }
}

fn test_app() -> Router {
    let config = Arc::new(test_config());
    let auth_manager = Arc::new(AuthManager::new(&config).unwrap());
    let context = Arc::new(AppContext::new(
        config,
        auth_manager,
        Arc::new(InMemoryUserDirectory::with_cost(4)),
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryRateLimitStore::new()),
    ));
    create_router(context)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Mint a token directly, bypassing registration.
fn mint_token(sub: &str, email: Option<&str>, role: Option<&str>) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        name: None,
        role: role.map(str::to_string),
        jti: Uuid::new_v4().to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
        iss: TEST_ISSUER.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn register(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            json!({ "email": email, "password": "long-enough-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_empty_login_body_is_validation_error() {
    let app = test_app();
    let response = app
        .oneshot(json_request("POST", "/api/v1/auth/login", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_wrong_credentials_are_authentication_error() {
    let app = test_app();
    register(&app, "user@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "user@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("AUTHENTICATION_ERROR"));
    assert_eq!(body["error"]["message"], json!("Invalid email or password"));
}

#[tokio::test]
async fn test_auth_routes_rate_limited_per_ip() {
    let app = test_app();

    // Auth policy allows 5 per window; the 6th from the same IP is
    // rejected even though each attempt fails on its own merits.
    for _ in 0..5 {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(
                json!({ "email": "a@example.com", "password": "nope-nope" }).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(
            json!({ "email": "a@example.com", "password": "nope-nope" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("RATE_LIMIT"));

    // A different IP is unaffected.
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.20")
        .body(Body::from(
            json!({ "email": "a@example.com", "password": "nope-nope" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_headers_on_allowed_responses() {
    let app = test_app();
    let response = app
        .oneshot(json_request("POST", "/api/v1/auth/login", json!({})))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "5");
    assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "4");
    assert!(headers.contains_key("x-ratelimit-reset"));
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/account")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("AUTHENTICATION_ERROR"));
    assert_eq!(body["error"]["message"], json!("Authentication required"));
}

#[tokio::test]
async fn test_token_missing_email_claim_rejected() {
    let app = test_app();
    let token = mint_token("some-user-id", None, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/account")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing email"));
}

#[tokio::test]
async fn test_malformed_authorization_header_rejected() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/account")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], json!("Invalid or expired token"));
}

#[tokio::test]
async fn test_register_create_and_list_transactions() {
    let app = test_app();
    let token = register(&app, "ledger@example.com").await;

    let mut request = json_request(
        "POST",
        "/api/v1/transactions",
        json!({ "amountCents": -4599, "currency": "eur", "category": "groceries" }),
    );
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["currency"], json!("EUR"));
    assert_eq!(body["data"]["amountCents"], json!(-4599));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/transactions?page=1&pageSize=10")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["total"], json!(1));
    assert_eq!(body["meta"]["hasMore"], json!(false));
}

#[tokio::test]
async fn test_invalid_transaction_input_reports_details() {
    let app = test_app();
    let token = register(&app, "ledger@example.com").await;

    let mut request = json_request(
        "POST",
        "/api/v1/transactions",
        json!({ "amountCents": 0, "currency": "EURO", "category": "" }),
    );
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    let details = body["error"]["details"].as_object().unwrap();
    assert!(details.contains_key("amountCents"));
    assert!(details.contains_key("currency"));
    assert!(details.contains_key("category"));
}

#[tokio::test]
async fn test_missing_transaction_is_not_found() {
    let app = test_app();
    let token = register(&app, "ledger@example.com").await;
    let missing = Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/transactions/{}", missing))
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found_not_unauthorized() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(
        body["error"]["message"],
        json!("Route GET /api/v1/nonexistent not found")
    );
}

#[tokio::test]
async fn test_admin_route_requires_admin_role() {
    let app = test_app();
    let token = register(&app, "plain@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/users")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("AUTHORIZATION_ERROR"));

    let admin_token = mint_token(
        &Uuid::new_v4().to_string(),
        Some("admin@example.com"),
        Some("admin"),
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/users")
                .header("authorization", format!("Bearer {}", admin_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = test_app();
    register(&app, "dupe@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            json!({ "email": "dupe@example.com", "password": "long-enough-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("CONFLICT"));
}

#[tokio::test]
async fn test_delete_account_purges_ledger() {
    let app = test_app();
    let token = register(&app, "gone@example.com").await;

    let mut request = json_request(
        "POST",
        "/api/v1/transactions",
        json!({ "amountCents": 100, "currency": "USD", "category": "misc" }),
    );
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/account")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["deleted"], json!(true));

    // The token still verifies, but the account behind it is gone.
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/account")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_exempt_from_the_gate() {
    let app = test_app();
    for _ in 0..20 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
}
