//! Spendlink Core Library
//!
//! Resolves bank transactions to expense accounts in a personal ledger:
//! - Text normalization and search query generation
//! - Deterministic token-overlap matching over ledger search results
//! - AI fallback for naming or choosing accounts (OpenAI-compatible, Gemini, Ollama)
//! - Prompt library for customizable AI prompts
//! - Ledger client and decision applier

pub mod ai;
pub mod config;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod prompts;

/// Test utilities including the in-memory ledger and mock completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, CompletionOptions, GeminiBackend, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use config::MatcherConfig;
pub use error::{Error, Result};
pub use ledger::{
    apply_decision, process_transaction, AccountSearch, AppliedAccount, HttpLedger, LedgerClient,
    LedgerConfig, LedgerTransaction, NewAccountRequest, ProcessedTransaction,
};
pub use matcher::{
    AccountCandidate, AccountSource, Decision, DecisionCache, ExpenseAccountMatcher,
    FallbackPolicy, Transaction,
};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
