//! Shared command setup and output helpers

use std::path::Path;

use anyhow::{Context, Result};
use spendlink_core::{
    AIBackend, AIClient, Decision, ExpenseAccountMatcher, HttpLedger, LedgerConfig, MatcherConfig,
};
use tracing::debug;

/// Matcher wired to the configured ledger and AI backend
pub type LiveMatcher = ExpenseAccountMatcher<HttpLedger, AIClient>;

/// Load matcher config from `path`, the override location, or built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<MatcherConfig> {
    MatcherConfig::load(path).context("Failed to load matcher config")
}

/// Ledger client from `LEDGER_URL` / `LEDGER_TOKEN`
pub fn open_ledger() -> Result<HttpLedger> {
    let config = LedgerConfig::from_env()
        .context("Ledger not configured: set LEDGER_URL and LEDGER_TOKEN")?;
    Ok(HttpLedger::new(&config))
}

/// AI backend selected by `AI_BACKEND`
pub fn open_ai() -> Result<AIClient> {
    let client = AIClient::from_env().context(
        "AI backend not configured: set AI_BACKEND and the backend's variables \
         (e.g. OPENAI_COMPATIBLE_API_KEY, GEMINI_API_KEY or OLLAMA_HOST)",
    )?;
    debug!(backend = client.name(), model = client.model(), host = client.host(), "AI backend");
    Ok(client)
}

pub fn build_matcher(config_path: Option<&Path>) -> Result<LiveMatcher> {
    let config = load_config(config_path)?;
    Ok(ExpenseAccountMatcher::new(open_ledger()?, open_ai()?, config))
}

/// One-line human readable form of a decision
pub fn format_decision(decision: &Decision) -> String {
    match decision {
        Decision::Existing { account } => {
            format!("existing  {} (id {}, {})", account.name, account.id, account.source)
        }
        Decision::Create { account } if account.description.is_empty() => {
            format!("create    {} ({})", account.name, account.source)
        }
        Decision::Create { account } => format!(
            "create    {} ({}): {}",
            account.name, account.source, account.description
        ),
    }
}
