// ============================================================================
// Auth Manager
// ============================================================================
//
// JWT issuance and the authentication gate. Token verification is
// delegated to jsonwebtoken (signature + expiry + issuer); the gate
// then requires a non-empty user id and email in the payload before
// shaping an AuthenticatedUser. Any verification failure collapses to
// a single generic message so verifier internals never reach clients.
//
// ============================================================================

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tally_config::Config;
use tally_error::ApiError;
use uuid::Uuid;

use crate::users::{AuthenticatedUser, Role, UserRecord};

/// Message used for every token-verification failure. Distinct
/// payload-shape messages below exist for diagnostics; clients always
/// see a 401 either way.
const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// JWT ID (unique per token)
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl_hours: i64,
    issuer: String,
}

impl AuthManager {
    pub fn new(config: &Config) -> Result<Self> {
        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is not configured; refusing to start without one");
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_token_ttl_hours: config.access_token_ttl_hours,
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Create an access token for a user.
    /// Returns the encoded token and its expiry (epoch seconds).
    pub fn create_token(&self, user: &UserRecord) -> Result<(String, i64)> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.access_token_ttl_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            email: Some(user.email.clone()),
            name: user.display_name.clone(),
            role: Some(user.role.as_str().to_string()),
            jti: Uuid::new_v4().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, exp.timestamp()))
    }

    /// Verify signature, expiry and issuer, returning the raw claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// The authentication gate: verify a bearer token and shape the
    /// request identity. An AuthenticatedUser is only produced when
    /// both the user id and email claims are present and non-empty.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let claims = self.verify_token(token).map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            ApiError::authentication(INVALID_TOKEN)
        })?;

        if claims.sub.trim().is_empty() {
            return Err(ApiError::authentication("Invalid token payload: missing user ID"));
        }

        let email = match claims.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => {
                return Err(ApiError::authentication("Invalid token payload: missing email"));
            }
        };

        Ok(AuthenticatedUser {
            id: claims.sub,
            email,
            display_name: claims.name,
            role: Role::from_claim(claims.role.as_deref()),
        })
    }
}
