// ============================================================================
// Application Context
// ============================================================================
//
// Shared state handed to routes and middleware. Collaborators are
// constructor-injected trait objects so deployments can swap the
// in-memory doubles for real backends without touching call sites.
//
// ============================================================================

use std::sync::Arc;
use tally_config::Config;

use crate::auth::AuthManager;
use crate::ledger::LedgerService;
use crate::rate_limit::RateLimitStore;
use crate::users::UserDirectory;

pub struct AppContext {
    pub config: Arc<Config>,
    pub auth_manager: Arc<AuthManager>,
    pub users: Arc<dyn UserDirectory>,
    pub ledger: Arc<dyn LedgerService>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        auth_manager: Arc<AuthManager>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<dyn LedgerService>,
        rate_limiter: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            config,
            auth_manager,
            users,
            ledger,
            rate_limiter,
        }
    }
}
