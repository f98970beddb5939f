// ============================================================================
// Extractors
// ============================================================================
//
// CurrentUser reads the identity the auth gate attached to the
// request. Handlers taking it can only run on authenticated requests;
// a missing attachment means the route was wired outside the gate and
// is rejected with a 401.
//
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tally_error::ApiError;

use crate::users::AuthenticatedUser;

/// The authenticated identity for this request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::authentication("Authentication required"))
    }
}
