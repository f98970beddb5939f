// ============================================================================
// User Directory
// ============================================================================
//
// Credential verification and user storage are external collaborators
// of the gate; the trait below is their seam. The in-memory
// implementation backs development and tests.
//
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tally_error::ApiError;
use tokio::sync::Mutex;
use uuid::Uuid;

/// User role carried in token claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a role claim; anything other than "admin" is a regular user.
    pub fn from_claim(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::User,
        }
    }
}

/// The identity attached to a request after the auth gate passes.
///
/// Only ever constructed with non-empty `id` and `email`; immutable
/// for the lifetime of one request, never persisted.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

/// A stored user account
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for account creation (password still in plaintext)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub role: Role,
}

/// Seam for credential verification and account storage
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create an account; fails with a conflict if the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, ApiError>;

    /// Verify an email/password pair. `Ok(None)` means the credentials
    /// do not match any account; callers decide how to report that.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ApiError>;

    /// Returns true if an account was removed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError>;
}

/// In-memory directory with bcrypt password hashes
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<Uuid, UserRecord>>,
    bcrypt_cost: u32,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// Lower-cost variant for tests, where hashing latency matters
    /// more than hash strength.
    pub fn with_cost(bcrypt_cost: u32) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            bcrypt_cost,
        }
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, ApiError> {
        let email = new_user.email.trim().to_ascii_lowercase();

        let password_hash = bcrypt::hash(&new_user.password, self.bcrypt_cost)
            .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == email) {
            return Err(ApiError::conflict("An account with this email already exists"));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email,
            display_name: new_user.display_name,
            role: new_user.role,
            password_hash,
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());

        tracing::info!(user_id = %record.id, "User account created");
        Ok(record)
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, ApiError> {
        let email = email.trim().to_ascii_lowercase();
        let user = {
            let users = self.users.lock().await;
            users.values().find(|u| u.email == email).cloned()
        };

        let Some(user) = user else {
            return Ok(None);
        };

        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| ApiError::internal(format!("Password verification failed: {}", e)))?;

        Ok(matches.then_some(user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, ApiError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.users.lock().await.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let users = self.users.lock().await;
        let mut all: Vec<UserRecord> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "CorrectHorse1".to_string(),
            display_name: Some("Test".to_string()),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_verify() {
        let directory = InMemoryUserDirectory::with_cost(4);
        let created = directory.create_user(new_user("a@example.com")).await.unwrap();

        let verified = directory
            .verify_credentials("a@example.com", "CorrectHorse1")
            .await
            .unwrap();
        assert_eq!(verified.unwrap().id, created.id);

        let wrong = directory
            .verify_credentials("a@example.com", "wrong-password")
            .await
            .unwrap();
        assert!(wrong.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let directory = InMemoryUserDirectory::with_cost(4);
        directory.create_user(new_user("a@example.com")).await.unwrap();

        let err = directory
            .create_user(new_user("A@Example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let directory = InMemoryUserDirectory::with_cost(4);
        let created = directory.create_user(new_user("a@example.com")).await.unwrap();

        assert!(directory.delete_user(created.id).await.unwrap());
        assert!(!directory.delete_user(created.id).await.unwrap());
        assert!(directory.find_by_id(created.id).await.unwrap().is_none());
    }

    #[test]
    fn test_role_from_claim() {
        assert_eq!(Role::from_claim(Some("admin")), Role::Admin);
        assert_eq!(Role::from_claim(Some("Admin")), Role::Admin);
        assert_eq!(Role::from_claim(Some("user")), Role::User);
        assert_eq!(Role::from_claim(Some("superuser")), Role::User);
        assert_eq!(Role::from_claim(None), Role::User);
    }
}
