//! Apply command: resolve ledger transactions and update their destinations

use std::path::Path;

use anyhow::{bail, Result};
use spendlink_core::{
    process_transaction, AIBackend, AccountSearch, ExpenseAccountMatcher, LedgerClient,
};
use tracing::error;

use super::core::{build_matcher, format_decision, open_ledger};

/// Outcome of a batch run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: Vec<String>,
}

pub async fn cmd_apply(config_path: Option<&Path>, ids: &[String]) -> Result<()> {
    let ledger = open_ledger()?;
    let matcher = build_matcher(config_path)?;

    let summary = apply_batch(&ledger, &matcher, ids).await;

    println!();
    println!(
        "{} applied, {} failed",
        summary.succeeded,
        summary.failed.len()
    );

    if !summary.failed.is_empty() {
        bail!("Failed transactions: {}", summary.failed.join(", "));
    }
    Ok(())
}

/// Process transactions one at a time, sharing the matcher's cache.
///
/// A failing transaction is reported and skipped; the batch continues.
pub async fn apply_batch<L, S, A>(
    ledger: &L,
    matcher: &ExpenseAccountMatcher<S, A>,
    ids: &[String],
) -> BatchSummary
where
    L: LedgerClient,
    S: AccountSearch,
    A: AIBackend,
{
    let mut summary = BatchSummary::default();

    for id in ids {
        match process_transaction(ledger, matcher, id).await {
            Ok(processed) => {
                let action = if processed.applied.created {
                    "new account"
                } else if processed.applied.recovered {
                    "recovered account"
                } else {
                    "account"
                };
                println!(
                    "{:>8}  {}  -> {} {}",
                    id,
                    format_decision(&processed.decision),
                    action,
                    processed.applied.account_id
                );
                summary.succeeded += 1;
            }
            Err(e) => {
                error!(transaction = %id, error = %e, "Failed to process transaction");
                println!("{:>8}  FAILED: {}", id, e);
                summary.failed.push(id.clone());
            }
        }
    }

    summary
}
