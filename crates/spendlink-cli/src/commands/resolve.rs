//! Resolve command: match a transaction text without touching the ledger

use std::path::Path;

use anyhow::Result;
use spendlink_core::{AIBackend, AccountSearch, ExpenseAccountMatcher, Transaction};

use super::core::{build_matcher, format_decision};

pub async fn cmd_resolve(
    config_path: Option<&Path>,
    description: &str,
    destination: Option<&str>,
    json: bool,
) -> Result<()> {
    let matcher = build_matcher(config_path)?;
    let output = resolve_output(&matcher, description, destination, json).await?;
    println!("{}", output);
    Ok(())
}

/// Resolve and render the decision as text or JSON
pub async fn resolve_output<S, A>(
    matcher: &ExpenseAccountMatcher<S, A>,
    description: &str,
    destination: Option<&str>,
    json: bool,
) -> Result<String>
where
    S: AccountSearch,
    A: AIBackend,
{
    let decision = matcher
        .match_transaction(&Transaction::new(description, destination))
        .await?;

    if json {
        Ok(serde_json::to_string_pretty(&decision)?)
    } else {
        Ok(format_decision(&decision))
    }
}
