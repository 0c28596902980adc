//! Search query generation
//!
//! Queries run from most to least specific: the raw destination name first
//! (exact brand capitalization), then full normalized texts, then description
//! prefixes, then single distinctive tokens. The collector stops at the first
//! query with results, so order is significant.

use super::placeholder::is_placeholder;
use super::types::{NormalizedText, Transaction};

/// Tokens this short are too generic to search for on their own
const MIN_SINGLE_TOKEN_LEN: usize = 4;

/// Build the ordered, de-duplicated list of search queries for a transaction
pub fn generate_queries(
    transaction: &Transaction,
    description: &NormalizedText,
    destination: &NormalizedText,
) -> Vec<String> {
    let mut queries = QuerySet::default();

    if let Some(raw) = transaction.destination_name.as_deref() {
        if !is_placeholder(raw) {
            queries.push(raw.trim());
        }
    }

    queries.push(&destination.normalized_text);
    queries.push(&description.normalized_text);

    let desc_tokens = &description.tokens;
    if desc_tokens.len() >= 3 {
        queries.push(&desc_tokens[..3].join(" "));
    }
    if desc_tokens.len() >= 2 {
        queries.push(&desc_tokens[..2].join(" "));
    }

    for token in desc_tokens.iter().chain(destination.tokens.iter()) {
        if token.chars().count() >= MIN_SINGLE_TOKEN_LEN {
            queries.push(token);
        }
    }

    queries.into_vec()
}

/// Insertion-ordered set of non-empty, non-placeholder queries
#[derive(Default)]
struct QuerySet {
    items: Vec<String>,
}

impl QuerySet {
    fn push(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() || is_placeholder(query) {
            return;
        }
        if !self.items.iter().any(|q| q == query) {
            self.items.push(query.to_string());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}
