//! Applying matcher decisions to the ledger

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::AIBackend;
use crate::error::{Error, Result};
use crate::matcher::{Decision, ExpenseAccountMatcher, Transaction};

use super::{AccountSearch, LedgerClient, LedgerTransaction, NewAccountRequest};

/// Results fetched when recovering from a duplicate-name conflict
const RECOVERY_SEARCH_LIMIT: usize = 15;

/// The account a transaction ended up pointing at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAccount {
    pub account_id: String,
    pub name: String,
    /// A new account was created for this transaction
    pub created: bool,
    /// Creation hit a duplicate name and the existing id was recovered
    pub recovered: bool,
}

/// Outcome of processing one ledger transaction end to end
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedTransaction {
    pub transaction: LedgerTransaction,
    pub decision: Decision,
    pub applied: AppliedAccount,
}

/// Make `transaction_id` point at the account `decision` describes,
/// creating that account first when needed.
pub async fn apply_decision<L>(
    ledger: &L,
    transaction_id: &str,
    decision: &Decision,
) -> Result<AppliedAccount>
where
    L: LedgerClient + ?Sized,
{
    let applied = match decision {
        Decision::Existing { account } => AppliedAccount {
            account_id: account.id.clone(),
            name: account.name.clone(),
            created: false,
            recovered: false,
        },
        Decision::Create { account } => {
            let request = NewAccountRequest::expense(&account.name, &account.description);
            match ledger.create_account(&request).await {
                Ok(id) => {
                    info!(account = %account.name, id = %id, "Created expense account");
                    AppliedAccount {
                        account_id: id,
                        name: account.name.clone(),
                        created: true,
                        recovered: false,
                    }
                }
                Err(Error::Conflict(name)) => {
                    warn!(account = %name, "Expense account already exists, recovering its id");
                    let id = recover_existing_id(ledger, &name).await?;
                    AppliedAccount {
                        account_id: id,
                        name,
                        created: false,
                        recovered: true,
                    }
                }
                Err(e) => return Err(e),
            }
        }
    };

    ledger
        .set_destination_account(transaction_id, &applied.account_id)
        .await?;
    Ok(applied)
}

/// Find the id of an account the ledger says already exists
async fn recover_existing_id<S>(search: &S, name: &str) -> Result<String>
where
    S: AccountSearch + ?Sized,
{
    let found = search
        .search_expense_accounts(name, RECOVERY_SEARCH_LIMIT)
        .await?;

    found
        .iter()
        .find(|c| c.name.to_lowercase() == name.to_lowercase())
        .or_else(|| found.first())
        .map(|c| c.id.clone())
        .ok_or_else(|| Error::Conflict(name.to_string()))
}

/// Fetch a ledger transaction, resolve its expense account and apply it.
///
/// This is the unit of work a serialized job worker runs per transaction.
pub async fn process_transaction<L, S, A>(
    ledger: &L,
    matcher: &ExpenseAccountMatcher<S, A>,
    transaction_id: &str,
) -> Result<ProcessedTransaction>
where
    L: LedgerClient + ?Sized,
    S: AccountSearch,
    A: AIBackend,
{
    let transaction = ledger.get_transaction(transaction_id).await?;
    let decision = matcher
        .match_transaction(&Transaction::new(
            transaction.description.clone(),
            transaction.destination_name.as_deref(),
        ))
        .await?;
    let applied = apply_decision(ledger, &transaction.id, &decision).await?;

    Ok(ProcessedTransaction {
        transaction,
        decision,
        applied,
    })
}
