//! Candidate collection against the ledger's fuzzy account search

use tracing::{debug, warn};

use crate::ledger::AccountSearch;

use super::placeholder::is_placeholder;
use super::types::AccountCandidate;

/// Run `queries` in order and return the first non-empty result set.
///
/// Candidates with placeholder names are dropped. A failing search is logged
/// and the next query is tried; only running out of queries yields an empty
/// list.
pub async fn collect_candidates<S>(
    search: &S,
    queries: &[String],
    limit: usize,
) -> Vec<AccountCandidate>
where
    S: AccountSearch + ?Sized,
{
    for query in queries {
        if is_placeholder(query) {
            continue;
        }

        let results = match search.search_expense_accounts(query, limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query = %query, error = %e, "Expense account search failed, trying next query");
                continue;
            }
        };

        let usable: Vec<AccountCandidate> = results
            .into_iter()
            .filter(|c| !is_placeholder(&c.name))
            .collect();

        debug!(query = %query, count = usable.len(), "Expense account search");

        if !usable.is_empty() {
            return usable;
        }
    }

    Vec::new()
}
