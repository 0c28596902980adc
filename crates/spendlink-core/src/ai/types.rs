//! AI backend request/response types
//!
//! These types are backend-agnostic and used across all AI implementations.

/// Sampling options for a single completion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens. Each backend maps this to its own
    /// parameter name (`max_tokens`, `max_completion_tokens`,
    /// `maxOutputTokens`, `num_predict`).
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Which kind of decision the AI was asked for / returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Existing,
    Create,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Create => "create",
        }
    }
}

/// A validated account decision as proposed by the AI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProposal {
    pub decision: DecisionKind,
    pub name: String,
    pub description: String,
}
