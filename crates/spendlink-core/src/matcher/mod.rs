//! Expense account matcher
//!
//! Resolves a bank transaction to an expense account in the ledger:
//!
//! 1. Normalize description and destination into canonical tokens
//! 2. Generate search queries, most specific first
//! 3. Collect candidates from the ledger's fuzzy search (first hit wins)
//! 4. Score candidates by token overlap
//! 5. Fall back to the AI backend when nothing matched deterministically
//!
//! Decisions are cached per normalized text for the lifetime of the matcher,
//! so equivalent transactions never repeat a search or AI call.

mod cache;
mod collector;
mod fallback;
mod normalize;
mod placeholder;
mod queries;
mod scoring;
mod types;

pub use cache::{cache_key, DecisionCache};
pub use collector::collect_candidates;
pub use fallback::resolve_with_ai;
pub use normalize::{normalize, normalize_opt};
pub use placeholder::{is_placeholder, is_placeholder_opt};
pub use queries::generate_queries;
pub use scoring::{match_candidate, minimum_matches, FallbackPolicy};
pub use types::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::ai::AIBackend;
use crate::config::MatcherConfig;
use crate::error::{Error, Result};
use crate::ledger::AccountSearch;
use crate::prompts::PromptLibrary;

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Resolves transactions to expense accounts
///
/// Generic over the search collaborator and the AI backend so tests can plug
/// in the in-memory ledger and [`crate::ai::MockBackend`].
pub struct ExpenseAccountMatcher<S, A> {
    search: S,
    ai: A,
    config: MatcherConfig,
    prompts: Mutex<PromptLibrary>,
    cache: DecisionCache,
    /// One async lock per cache key currently being resolved
    in_flight: Mutex<HashMap<String, KeyLock>>,
}

impl<S, A> ExpenseAccountMatcher<S, A>
where
    S: AccountSearch,
    A: AIBackend,
{
    /// Create a matcher using the default prompt library (with overrides)
    pub fn new(search: S, ai: A, config: MatcherConfig) -> Self {
        Self::with_prompts(search, ai, config, PromptLibrary::new())
    }

    pub fn with_prompts(search: S, ai: A, config: MatcherConfig, prompts: PromptLibrary) -> Self {
        Self {
            search,
            ai,
            config,
            prompts: Mutex::new(prompts),
            cache: DecisionCache::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    pub fn ai(&self) -> &A {
        &self.ai
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    /// Resolve `transaction` to an existing account or a proposal for a new one.
    ///
    /// Fails with [`Error::InvalidInput`] for a blank description. AI
    /// failures propagate and leave the cache untouched.
    pub async fn match_transaction(&self, transaction: &Transaction) -> Result<Decision> {
        if transaction.description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "transaction description is empty".into(),
            ));
        }

        let description = normalize(&transaction.description);
        let destination = normalize_opt(transaction.destination_name.as_deref());
        let key = cache_key(&description, &destination);

        if let Some(decision) = self.cache.get(&key) {
            debug!(key = %key, "Decision cache hit");
            return Ok(decision);
        }

        let lock = self.key_lock(&key)?;
        let result = {
            let _guard = lock.lock().await;

            // Another task may have resolved this key while we waited
            match self.cache.get(&key) {
                Some(decision) => {
                    debug!(key = %key, "Decision cache hit after wait");
                    Ok(decision)
                }
                None => {
                    let resolved = self
                        .resolve(transaction, &description, &destination)
                        .await;
                    if let Ok(decision) = &resolved {
                        self.cache.insert(key.as_str(), decision);
                    }
                    resolved
                }
            }
        };
        self.release_key_lock(&key, lock);

        let decision = result?;
        info!(
            description = %transaction.description,
            account = %decision.account_name(),
            source = %decision.source(),
            create = decision.is_create(),
            "Resolved expense account"
        );
        Ok(decision)
    }

    /// The uncached resolution pipeline
    async fn resolve(
        &self,
        transaction: &Transaction,
        description: &NormalizedText,
        destination: &NormalizedText,
    ) -> Result<Decision> {
        let queries = generate_queries(transaction, description, destination);
        let candidates = collect_candidates(&self.search, &queries, self.config.search_limit).await;

        if let Some(candidate) = match_candidate(
            &candidates,
            &description.tokens,
            &destination.tokens,
            self.config.fallback_policy(),
        ) {
            return Ok(Decision::existing(candidate, AccountSource::Autocomplete));
        }

        if self.config.autocomplete_fallback {
            if let Some(first) = candidates.iter().find(|c| !is_placeholder(&c.name)) {
                debug!(account = %first.name, "No confident match, taking first candidate");
                return Ok(Decision::existing(first, AccountSource::AutocompleteFallback));
            }
        }

        resolve_with_ai(
            &self.ai,
            &self.prompts,
            transaction,
            &candidates,
            &self.config.completion_options(),
        )
        .await
    }

    fn key_lock(&self, key: &str) -> Result<KeyLock> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| Error::InvalidData("matcher key lock poisoned".into()))?;
        Ok(in_flight.entry(key.to_string()).or_default().clone())
    }

    /// Forget the key's lock once nobody else is waiting on it
    fn release_key_lock(&self, key: &str, lock: KeyLock) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            // One reference in the map, one held here
            if Arc::strong_count(&lock) <= 2 {
                in_flight.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{CompletionOptions, MockBackend};
    use crate::test_utils::InMemoryLedger;

    fn matcher(
        ledger: InMemoryLedger,
        ai: MockBackend,
        config: MatcherConfig,
    ) -> ExpenseAccountMatcher<InMemoryLedger, MockBackend> {
        ExpenseAccountMatcher::with_prompts(ledger, ai, config, PromptLibrary::embedded_only())
    }

    #[tokio::test]
    async fn test_single_candidate_resolves_without_ai() {
        let ledger = InMemoryLedger::new().with_search_results(
            "Starbucks",
            vec![AccountCandidate::new("9", "Starbucks Coffee")],
        );
        let ai = MockBackend::new();
        let m = matcher(ledger, ai.clone(), MatcherConfig::default());

        let decision = m
            .match_transaction(&Transaction::new(
                "COMPRA EN STARBUCKS MADRID 1234567890",
                Some("Starbucks"),
            ))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::existing(
                &AccountCandidate::new("9", "Starbucks Coffee"),
                AccountSource::Autocomplete
            )
        );
        assert_eq!(m.search().searched_queries(), vec!["Starbucks"]);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_candidates_asks_ai_to_create() {
        let ai = MockBackend::new().with_reply(
            r#"{"decision":"create","account":{"name":"Generic Merchant","description":""}}"#,
        );
        let m = matcher(InMemoryLedger::new(), ai.clone(), MatcherConfig::default());

        let decision = m
            .match_transaction(&Transaction::new("Unknown payment", None))
            .await
            .unwrap();

        assert_eq!(decision, Decision::create("Generic Merchant", ""));
        assert_eq!(decision.source(), AccountSource::AiNew);
        assert_eq!(ai.calls(), 1);
        // The placeholder token is never searched on its own
        assert_eq!(
            m.search().searched_queries(),
            vec!["unknown payment", "payment"]
        );
    }

    #[tokio::test]
    async fn test_blank_description_is_invalid_input() {
        let m = matcher(
            InMemoryLedger::new(),
            MockBackend::new(),
            MatcherConfig::default(),
        );

        let err = m
            .match_transaction(&Transaction::new("   ", Some("Starbucks")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(m.search().search_calls(), 0);
    }

    #[tokio::test]
    async fn test_equivalent_transactions_hit_cache() {
        let ai = MockBackend::new().with_reply(
            r#"{"decision":"create","account":{"name":"Bar Pepe","description":"Bar"}}"#,
        );
        let m = matcher(InMemoryLedger::new(), ai.clone(), MatcherConfig::default());

        let first = m
            .match_transaction(&Transaction::new("COMPRA EN BAR PEPE 4412", None))
            .await
            .unwrap();
        let searches = m.search().search_calls();

        let second = m
            .match_transaction(&Transaction::new("compra en bar pepe 9981", Some("")))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(ai.calls(), 1);
        assert_eq!(m.search().search_calls(), searches);
        assert_eq!(m.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_mutating_result_does_not_change_cache() {
        let ai = MockBackend::new().with_reply(
            r#"{"decision":"create","account":{"name":"Bar Pepe","description":"Bar"}}"#,
        );
        let m = matcher(InMemoryLedger::new(), ai, MatcherConfig::default());
        let tx = Transaction::new("BAR PEPE", None);

        let mut first = m.match_transaction(&tx).await.unwrap();
        if let Decision::Create { account } = &mut first {
            account.name = "Tampered".to_string();
        }

        let second = m.match_transaction(&tx).await.unwrap();
        assert_eq!(second.account_name(), "Bar Pepe");
    }

    #[tokio::test]
    async fn test_lenient_policy_accepts_partial_overlap() {
        let ledger = InMemoryLedger::new().with_search_results(
            "bar pepe centro",
            vec![
                AccountCandidate::new("1", "Pepe Jeans"),
                AccountCandidate::new("2", "Zara"),
            ],
        );
        let ai = MockBackend::new();
        let m = matcher(ledger, ai.clone(), MatcherConfig::default());

        let decision = m
            .match_transaction(&Transaction::new("BAR PEPE CENTRO", None))
            .await
            .unwrap();

        assert_eq!(decision.account_id(), Some("1"));
        assert_eq!(decision.source(), AccountSource::Autocomplete);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_policy_escalates_to_ai() {
        let ledger = InMemoryLedger::new().with_search_results(
            "bar pepe centro",
            vec![
                AccountCandidate::new("1", "Pepe Jeans"),
                AccountCandidate::new("2", "Zara"),
            ],
        );
        let ai = MockBackend::new().with_reply(
            r#"{"decision":"create","account":{"name":"Bar Pepe","description":"Bar"}}"#,
        );
        let config = MatcherConfig {
            lenient_fallback: false,
            ..MatcherConfig::default()
        };
        let m = matcher(ledger, ai.clone(), config);

        let decision = m
            .match_transaction(&Transaction::new("BAR PEPE CENTRO", None))
            .await
            .unwrap();

        assert_eq!(decision, Decision::create("Bar Pepe", "Bar"));
        assert_eq!(ai.calls(), 1);
        assert!(ai.prompts()[0].contains("- Pepe Jeans\n- Zara"));
    }

    #[tokio::test]
    async fn test_ai_existing_pick_is_verified() {
        let ledger = InMemoryLedger::new().with_search_results(
            "repsol",
            vec![
                AccountCandidate::new("1", "Starbucks"),
                AccountCandidate::new("2", "Shell"),
            ],
        );
        let ai = MockBackend::new()
            .with_reply(r#"{"decision":"existing","account":{"name":"Not In List"}}"#);
        let m = matcher(ledger, ai, MatcherConfig::default());

        let decision = m
            .match_transaction(&Transaction::new("REPSOL", None))
            .await
            .unwrap();

        assert!(decision.is_create());
        assert_eq!(decision.source(), AccountSource::AiNew);
    }

    #[tokio::test]
    async fn test_autocomplete_fallback_skips_ai() {
        let ledger = InMemoryLedger::new().with_search_results(
            "repsol",
            vec![
                AccountCandidate::new("1", "Starbucks"),
                AccountCandidate::new("2", "Shell"),
            ],
        );
        let ai = MockBackend::new();
        let config = MatcherConfig {
            autocomplete_fallback: true,
            ..MatcherConfig::default()
        };
        let m = matcher(ledger, ai.clone(), config);

        let decision = m
            .match_transaction(&Transaction::new("REPSOL", None))
            .await
            .unwrap();

        assert_eq!(decision.account_id(), Some("1"));
        assert_eq!(decision.source(), AccountSource::AutocompleteFallback);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_ai_failure_is_not_cached() {
        let ai = MockBackend::new().with_reply("Sorry, I cannot help with that.");
        let m = matcher(InMemoryLedger::new(), ai.clone(), MatcherConfig::default());
        let tx = Transaction::new("MYSTERY SHOP", None);

        let err = m.match_transaction(&tx).await.unwrap_err();
        assert!(err.is_ai_protocol());
        assert!(m.cache().is_empty());

        // The script is exhausted, so the mock's default reply is used
        let decision = m.match_transaction(&tx).await.unwrap();
        assert_eq!(decision.account_name(), "Mock Merchant");
        assert_eq!(ai.calls(), 2);
    }

    /// Yields to the scheduler before every completion, so a resolution is
    /// still in flight when a concurrent call starts
    struct YieldingBackend(MockBackend);

    #[async_trait::async_trait]
    impl AIBackend for YieldingBackend {
        async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
            tokio::task::yield_now().await;
            self.0.complete(prompt, options).await
        }

        async fn health_check(&self) -> bool {
            self.0.health_check().await
        }

        fn model(&self) -> &str {
            self.0.model()
        }

        fn host(&self) -> &str {
            self.0.host()
        }

        fn name(&self) -> &'static str {
            self.0.name()
        }
    }

    fn yielding_matcher(
        ai: MockBackend,
    ) -> ExpenseAccountMatcher<InMemoryLedger, YieldingBackend> {
        ExpenseAccountMatcher::with_prompts(
            InMemoryLedger::new(),
            YieldingBackend(ai),
            MatcherConfig::default(),
            PromptLibrary::embedded_only(),
        )
    }

    #[tokio::test]
    async fn test_concurrent_calls_resolve_once() {
        let ai = MockBackend::new().with_reply(
            r#"{"decision":"create","account":{"name":"Bar Pepe","description":""}}"#,
        );
        let m = yielding_matcher(ai.clone());
        let tx = Transaction::new("BAR PEPE", None);

        let (a, b) = tokio::join!(m.match_transaction(&tx), m.match_transaction(&tx));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(ai.calls(), 1);

        // Only the first call searched; the second waited on the key lock
        let single = yielding_matcher(MockBackend::new());
        single.match_transaction(&tx).await.unwrap();
        assert_eq!(m.search().search_calls(), single.search().search_calls());
    }

    #[tokio::test]
    async fn test_dropped_call_leaves_cache_empty() {
        let ai = MockBackend::new().with_reply(
            r#"{"decision":"create","account":{"name":"Bar Pepe","description":""}}"#,
        );
        let m = yielding_matcher(ai.clone());
        let tx = Transaction::new("BAR PEPE", None);

        let finished = tokio::select! {
            biased;
            _ = m.match_transaction(&tx) => true,
            _ = std::future::ready(()) => false,
        };
        assert!(!finished);
        assert!(m.cache().is_empty());
        assert_eq!(ai.calls(), 0);

        let decision = m.match_transaction(&tx).await.unwrap();
        assert_eq!(decision, Decision::create("Bar Pepe", ""));
        assert_eq!(ai.calls(), 1);
        assert_eq!(m.cache().len(), 1);
    }
}
