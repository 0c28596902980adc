//! AI fallback resolution
//!
//! Runs only when the deterministic matcher found nothing. With no search
//! candidates the model is asked to name a new account; otherwise it picks
//! one of the listed candidates or proposes a new one. A model's claim that
//! an account already exists is only trusted when the name matches a real
//! candidate.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::ai::parsing::{parse_account_decision, parse_create_decision};
use crate::ai::{AIBackend, CompletionOptions, DecisionKind};
use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};

use super::placeholder::{is_placeholder, is_placeholder_opt};
use super::types::{AccountCandidate, AccountSource, Decision, Transaction};

/// Resolve a transaction through the AI backend.
///
/// Protocol and transport failures propagate; nothing is defaulted.
pub async fn resolve_with_ai<A>(
    ai: &A,
    prompts: &Mutex<PromptLibrary>,
    transaction: &Transaction,
    candidates: &[AccountCandidate],
    options: &CompletionOptions,
) -> Result<Decision>
where
    A: AIBackend + ?Sized,
{
    let names: Vec<&str> = candidates
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| !is_placeholder(name))
        .collect();

    if names.is_empty() {
        let prompt = render_prompt(prompts, PromptId::CreateExpenseAccount, transaction, None)?;
        let response = ai.complete(&prompt, options).await?;
        debug!(backend = ai.name(), response = %response, "AI create response");

        let proposal = parse_create_decision(&response)?;
        return Ok(Decision::create(proposal.name, proposal.description));
    }

    let listing = names
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = render_prompt(
        prompts,
        PromptId::SelectExpenseAccount,
        transaction,
        Some(&listing),
    )?;
    let response = ai.complete(&prompt, options).await?;
    debug!(backend = ai.name(), response = %response, "AI select response");

    let proposal = parse_account_decision(&response)?;
    match proposal.decision {
        DecisionKind::Create => Ok(Decision::create(proposal.name, proposal.description)),
        DecisionKind::Existing => {
            let wanted = proposal.name.to_lowercase();
            match candidates
                .iter()
                .find(|c| !is_placeholder(&c.name) && c.name.to_lowercase() == wanted)
            {
                Some(candidate) => Ok(Decision::existing(candidate, AccountSource::Ai)),
                None => {
                    warn!(
                        account = %proposal.name,
                        "AI chose an account that is not among the candidates, creating it instead"
                    );
                    Ok(Decision::create(proposal.name, proposal.description))
                }
            }
        }
    }
}

/// Render a prompt while holding the library lock; never held across an await
fn render_prompt(
    prompts: &Mutex<PromptLibrary>,
    id: PromptId,
    transaction: &Transaction,
    candidates: Option<&str>,
) -> Result<String> {
    let mut vars: HashMap<&str, &str> = HashMap::new();
    vars.insert("description", transaction.description.trim());
    if !is_placeholder_opt(transaction.destination_name.as_deref()) {
        if let Some(destination) = transaction.destination_name.as_deref() {
            vars.insert("destination", destination.trim());
        }
    }
    if let Some(candidates) = candidates {
        vars.insert("candidates", candidates);
    }

    let mut library = prompts
        .lock()
        .map_err(|_| Error::InvalidData("prompt library lock poisoned".into()))?;
    Ok(library.get(id)?.render(&vars))
}
