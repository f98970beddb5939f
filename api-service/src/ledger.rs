// ============================================================================
// Ledger Service
// ============================================================================
//
// Transaction storage behind the gate. Like the user directory this
// is an external collaborator; the in-memory implementation is the
// development/test double. Per-user CRUD with offset pagination.
//
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tally_error::ApiError;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A single ledger entry owned by one user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    /// Signed amount in minor units; negative for expenses
    pub amount_cents: i64,
    /// ISO 4217 currency code
    pub currency: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount_cents: i64,
    pub currency: String,
    pub category: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Seam for transaction storage
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// One page of a user's transactions, newest first, plus the
    /// total count for pagination metadata.
    async fn list(
        &self,
        owner: &str,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Transaction>, u64), ApiError>;

    async fn create(&self, owner: &str, new: NewTransaction) -> Result<Transaction, ApiError>;

    async fn get(&self, owner: &str, id: Uuid) -> Result<Option<Transaction>, ApiError>;

    /// Returns true if an entry was removed.
    async fn delete(&self, owner: &str, id: Uuid) -> Result<bool, ApiError>;

    /// Drop everything a user owns (account deletion).
    async fn purge_owner(&self, owner: &str) -> Result<(), ApiError>;
}

/// In-memory ledger keyed by owner id
pub struct InMemoryLedger {
    entries: Mutex<HashMap<String, Vec<Transaction>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerService for InMemoryLedger {
    async fn list(
        &self,
        owner: &str,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Transaction>, u64), ApiError> {
        let entries = self.entries.lock().await;
        let Some(owned) = entries.get(owner) else {
            return Ok((Vec::new(), 0));
        };

        let mut sorted: Vec<Transaction> = owned.clone();
        sorted.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

        let total = sorted.len() as u64;
        let offset = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
        let slice = sorted
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok((slice, total))
    }

    async fn create(&self, owner: &str, new: NewTransaction) -> Result<Transaction, ApiError> {
        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            amount_cents: new.amount_cents,
            currency: new.currency.to_ascii_uppercase(),
            category: new.category,
            note: new.note,
            occurred_at: new.occurred_at.unwrap_or(now),
            created_at: now,
        };

        let mut entries = self.entries.lock().await;
        entries
            .entry(owner.to_string())
            .or_default()
            .push(transaction.clone());

        Ok(transaction)
    }

    async fn get(&self, owner: &str, id: Uuid) -> Result<Option<Transaction>, ApiError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(owner)
            .and_then(|owned| owned.iter().find(|t| t.id == id).cloned()))
    }

    async fn delete(&self, owner: &str, id: Uuid) -> Result<bool, ApiError> {
        let mut entries = self.entries.lock().await;
        let Some(owned) = entries.get_mut(owner) else {
            return Ok(false);
        };
        let before = owned.len();
        owned.retain(|t| t.id != id);
        Ok(owned.len() < before)
    }

    async fn purge_owner(&self, owner: &str) -> Result<(), ApiError> {
        self.entries.lock().await.remove(owner);
        Ok(())
    }
}
