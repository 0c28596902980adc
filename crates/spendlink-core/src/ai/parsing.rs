//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap their JSON in markdown fences or surround it with prose.
//! These helpers isolate the JSON object and validate the account decision
//! schema. Every failure is an [`Error::AiProtocol`]; nothing is defaulted.

use serde_json::Value;

use crate::error::{Error, Result};

use super::types::{AccountProposal, DecisionKind};

/// Longest slice of a raw response quoted back in error messages
const RAW_EXCERPT_LEN: usize = 200;

/// Remove markdown code fences (```json ... ```) around a response
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Isolate the JSON object between the first `{` and the last `}`
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = strip_code_fences(response);
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::AiProtocol(format!(
            "No JSON found in AI response | Raw: {}",
            excerpt(response)
        ))),
    }
}

/// Parse and validate an account decision.
///
/// Valid responses are objects with `decision` in `{"existing","create"}` and
/// an `account` object carrying a non-empty string `name`. For `existing`
/// decisions a present `description` must be a string; for `create` a
/// missing or non-string description becomes `""`.
pub fn parse_account_decision(response: &str) -> Result<AccountProposal> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        Error::AiProtocol(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            excerpt(json_str)
        ))
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::AiProtocol("AI response is not a JSON object".into()))?;

    let decision = match object.get("decision").and_then(Value::as_str) {
        Some("existing") => DecisionKind::Existing,
        Some("create") => DecisionKind::Create,
        other => {
            return Err(Error::AiProtocol(format!(
                "Unknown decision in AI response: {:?}",
                other
            )))
        }
    };

    let account = object
        .get("account")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::AiProtocol("AI response has no account object".into()))?;

    let name = account
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::AiProtocol("AI response account has no name".into()))?;

    let description = match account.get("description") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) if decision == DecisionKind::Existing => {
            return Err(Error::AiProtocol(format!(
                "AI response account description is not a string: {}",
                other
            )))
        }
        Some(_) => String::new(),
    };

    Ok(AccountProposal {
        decision,
        name: name.to_string(),
        description,
    })
}

/// Parse a response that must be a `create` decision
pub fn parse_create_decision(response: &str) -> Result<AccountProposal> {
    let proposal = parse_account_decision(response)?;
    if proposal.decision != DecisionKind::Create {
        return Err(Error::AiProtocol(format!(
            "Expected a create decision, got {}",
            proposal.decision.as_str()
        )));
    }
    Ok(proposal)
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(RAW_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
