//! Test utilities for spendlink-core
//!
//! This module provides testing infrastructure: an in-memory ledger that
//! implements the ledger traits, and a mock completion server that speaks the
//! OpenAI-compatible, Gemini and Ollama wire formats.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, Uri},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::ledger::{AccountSearch, LedgerClient, LedgerTransaction, NewAccountRequest};
use crate::matcher::AccountCandidate;

#[derive(Default)]
struct LedgerState {
    /// Stored accounts, in creation order
    accounts: Vec<AccountCandidate>,
    transactions: HashMap<String, LedgerTransaction>,
    destinations: HashMap<String, String>,
    scripted: HashMap<String, Vec<AccountCandidate>>,
    failing: HashSet<String>,
    searched: Vec<String>,
    created: Vec<String>,
    next_id: u64,
}

/// In-memory ledger for tests
///
/// Search answers come from scripted results when a query has them, else
/// from stored accounts whose name contains the query (case-insensitive).
/// Account names are unique case-insensitively; duplicates yield
/// [`Error::Conflict`].
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_id: 1000,
                ..LedgerState::default()
            }),
        }
    }

    /// Answer `query` with exactly `results`
    pub fn with_search_results(self, query: &str, results: Vec<AccountCandidate>) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripted
            .insert(query.to_string(), results);
        self
    }

    /// Fail every search for `query`
    pub fn with_search_failure(self, query: &str) -> Self {
        self.state.lock().unwrap().failing.insert(query.to_string());
        self
    }

    /// Store an existing expense account
    pub fn with_account(self, id: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .accounts
            .push(AccountCandidate::new(id, name));
        self
    }

    /// Store a transaction
    pub fn with_transaction(self, id: &str, description: &str, destination: Option<&str>) -> Self {
        self.state.lock().unwrap().transactions.insert(
            id.to_string(),
            LedgerTransaction {
                id: id.to_string(),
                description: description.to_string(),
                destination_name: destination.map(str::to_string),
                amount: "10.00".to_string(),
                date: None,
            },
        );
        self
    }

    /// Queries searched so far, in order
    pub fn searched_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().searched.clone()
    }

    pub fn search_calls(&self) -> usize {
        self.state.lock().unwrap().searched.len()
    }

    /// Names of accounts created through [`LedgerClient::create_account`]
    pub fn created_accounts(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    /// Account id a transaction currently points at
    pub fn destination_of(&self, transaction_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .destinations
            .get(transaction_id)
            .cloned()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountSearch for InMemoryLedger {
    async fn search_expense_accounts(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AccountCandidate>> {
        let mut state = self.state.lock().unwrap();
        state.searched.push(query.to_string());

        if state.failing.contains(query) {
            return Err(Error::ledger(Some(500), format!("search failed for {}", query)));
        }

        let results = match state.scripted.get(query) {
            Some(results) => results.clone(),
            None => {
                let needle = query.to_lowercase();
                state
                    .accounts
                    .iter()
                    .filter(|a| a.name.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
        };

        Ok(results.into_iter().take(limit).collect())
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn create_account(&self, request: &NewAccountRequest) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let wanted = request.name.to_lowercase();
        if state.accounts.iter().any(|a| a.name.to_lowercase() == wanted) {
            return Err(Error::Conflict(request.name.clone()));
        }

        state.next_id += 1;
        let id = state.next_id.to_string();
        state.accounts.push(AccountCandidate {
            id: id.clone(),
            name: request.name.clone(),
            description: request.notes.clone(),
        });
        state.created.push(request.name.clone());
        Ok(id)
    }

    async fn get_transaction(&self, id: &str) -> Result<LedgerTransaction> {
        self.state
            .lock()
            .unwrap()
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    async fn set_destination_account(&self, transaction_id: &str, account_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.transactions.contains_key(transaction_id) {
            return Err(Error::NotFound(format!("transaction {}", transaction_id)));
        }
        state
            .destinations
            .insert(transaction_id.to_string(), account_id.to_string());
        Ok(())
    }
}

#[derive(Clone)]
struct ServerState {
    reply: String,
    last_request: Arc<Mutex<Option<Value>>>,
    last_gemini_key: Arc<Mutex<Option<String>>>,
}

/// Mock completion server for adapter tests
///
/// Every completion route answers with the same scripted text and records
/// the request body it received.
pub struct MockCompletionServer {
    addr: SocketAddr,
    last_request: Arc<Mutex<Option<Value>>>,
    last_gemini_key: Arc<Mutex<Option<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCompletionServer {
    /// Start the mock server on an available port
    pub async fn start(reply: &str) -> Self {
        let last_request = Arc::new(Mutex::new(None));
        let last_gemini_key = Arc::new(Mutex::new(None));
        let state = ServerState {
            reply: reply.to_string(),
            last_request: last_request.clone(),
            last_gemini_key: last_gemini_key.clone(),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat_completions))
            .route("/v1/models", get(handle_openai_models))
            .route("/v1beta/models", get(handle_gemini_models))
            .route("/v1beta/models/:action", post(handle_generate_content))
            .route("/api/generate", post(handle_ollama_generate))
            .route("/api/tags", get(handle_ollama_tags))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            last_request,
            last_gemini_key,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Body of the most recent completion request
    pub fn last_request(&self) -> Option<Value> {
        self.last_request.lock().unwrap().clone()
    }

    /// API key of the most recent Gemini request
    ///
    /// Taken from the `x-goog-api-key` header. A `key` query parameter is
    /// reported as `query:<value>` so tests can tell the two apart.
    pub fn last_gemini_key(&self) -> Option<String> {
        self.last_gemini_key.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn record(state: &ServerState, body: Value) {
    *state.last_request.lock().unwrap() = Some(body);
}

/// OpenAI-compatible chat completions
async fn handle_chat_completions(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let model = body["model"].clone();
    record(&state, body);
    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": state.reply},
            "finish_reason": "stop"
        }]
    }))
}

async fn handle_openai_models() -> Json<Value> {
    Json(json!({"object": "list", "data": [{"id": "gpt-4o-mini", "object": "model"}]}))
}

/// Gemini generateContent (`/v1beta/models/{model}:generateContent`)
async fn handle_generate_content(
    State(state): State<ServerState>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Json<Value> {
    let from_query = uri
        .query()
        .and_then(|q| q.split('&').find_map(|pair| pair.strip_prefix("key=")))
        .map(|key| format!("query:{}", key));
    let from_header = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_gemini_key.lock().unwrap() = from_query.or(from_header);
    record(&state, body);
    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": state.reply}]},
            "finishReason": "STOP"
        }]
    }))
}

async fn handle_gemini_models() -> Json<Value> {
    Json(json!({"models": [{"name": "models/gemini-1.5-flash"}]}))
}

/// Ollama generate endpoint
async fn handle_ollama_generate(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let model = body["model"].clone();
    record(&state, body);
    Json(json!({"model": model, "response": state.reply, "done": true}))
}

/// Ollama tags endpoint (health check)
async fn handle_ollama_tags() -> Json<Value> {
    Json(json!({"models": [{"name": "llama3.2:latest", "size": 4_000_000_000u64}]}))
}
