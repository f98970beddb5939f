// ============================================================================
// Tally API Service
// ============================================================================
//
// Personal finance API behind a request gate: fixed-window rate
// limiting, bearer-JWT authentication and a uniform response envelope.
//
// ============================================================================

pub mod auth;
pub mod context;
pub mod ledger;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod users;
pub mod utils;

pub use tally_error::{ApiError, ApiResult};

use anyhow::Result;
use std::sync::Arc;
use tally_config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AuthManager;
use crate::context::AppContext;
use crate::ledger::InMemoryLedger;
use crate::rate_limit::InMemoryRateLimitStore;
use crate::users::InMemoryUserDirectory;

pub async fn run() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let auth_manager = Arc::new(AuthManager::new(&config)?);
    let context = Arc::new(AppContext::new(
        config.clone(),
        auth_manager,
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryRateLimitStore::new()),
    ));

    let app = routes::create_router(context);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Tally API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
