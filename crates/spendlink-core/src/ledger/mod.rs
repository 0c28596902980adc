//! Ledger collaborators
//!
//! The matcher only ever searches for expense accounts ([`AccountSearch`]).
//! Applying a decision needs the wider [`LedgerClient`] surface: creating
//! accounts and re-pointing a transaction's destination.

mod apply;
mod http;

pub use apply::{apply_decision, process_transaction, AppliedAccount, ProcessedTransaction};
pub use http::{HttpLedger, LedgerConfig};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matcher::AccountCandidate;

/// Fuzzy (autocomplete) search over expense accounts
#[async_trait]
pub trait AccountSearch: Send + Sync {
    /// Search expense accounts matching `query`, at most `limit` results,
    /// ranked by the backend's own relevance.
    async fn search_expense_accounts(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AccountCandidate>>;
}

/// Kind of ledger account to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
        }
    }
}

/// Request to create a ledger account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountRequest {
    pub name: String,
    pub account_type: AccountType,
    pub notes: String,
}

impl NewAccountRequest {
    pub fn expense(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_type: AccountType::Expense,
            notes: notes.into(),
        }
    }
}

/// A transaction as stored in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub description: String,
    pub destination_name: Option<String>,
    pub amount: String,
    pub date: Option<NaiveDate>,
}

/// Everything the decision applier needs from the ledger
#[async_trait]
pub trait LedgerClient: AccountSearch {
    /// Create an account and return its id.
    ///
    /// Fails with [`crate::Error::Conflict`] when the name is already taken.
    async fn create_account(&self, request: &NewAccountRequest) -> Result<String>;

    /// Fetch a single transaction
    async fn get_transaction(&self, id: &str) -> Result<LedgerTransaction>;

    /// Point a transaction's destination at an existing account
    async fn set_destination_account(&self, transaction_id: &str, account_id: &str) -> Result<()>;
}
