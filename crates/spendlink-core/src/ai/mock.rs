//! Mock backend for testing
//!
//! Replays scripted completions in order and records every prompt it saw.
//! Useful for unit tests and development without a running LLM server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::CompletionOptions;
use super::AIBackend;

/// Reply used once the script is exhausted
const DEFAULT_REPLY: &str =
    r#"{"decision": "create", "account": {"name": "Mock Merchant", "description": "Mock account"}}"#;

#[derive(Clone)]
enum MockReply {
    Text(String),
    TransportError(String),
}

/// Mock AI backend for testing
///
/// Clones share the same script and call log, so a test can keep a handle
/// while the matcher owns another.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    options: Arc<Mutex<Vec<CompletionOptions>>>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            options: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Queue a completion reply
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(MockReply::Text(reply.into()));
        self
    }

    /// Queue a transport failure
    pub fn with_transport_error(self, message: impl Into<String>) -> Self {
        self.push(MockReply::TransportError(message.into()));
        self
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Sampling options received, in order
    pub fn options(&self) -> Vec<CompletionOptions> {
        self.options.lock().map(|o| o.clone()).unwrap_or_default()
    }

    fn push(&self, reply: MockReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Ok(mut seen) = self.options.lock() {
            seen.push(*options);
        }

        let next = self
            .script
            .lock()
            .map_err(|_| Error::ai_transport(self.name(), "mock script lock poisoned"))?
            .pop_front();

        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::TransportError(message)) => Err(Error::ai_transport(self.name(), message)),
            None => Ok(DEFAULT_REPLY.to_string()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
