//! Matcher input/output types

use serde::{Deserialize, Serialize};

/// A transaction as seen by the matcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub description: String,
    #[serde(default)]
    pub destination_name: Option<String>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, destination_name: Option<&str>) -> Self {
        Self {
            description: description.into(),
            destination_name: destination_name.map(str::to_string),
        }
    }
}

/// Output of the text normalizer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Space-joined canonical tokens (may be empty)
    pub normalized_text: String,
    /// Tokens in first-occurrence order, de-duplicated
    pub tokens: Vec<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// An expense account returned by the ledger's fuzzy search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCandidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AccountCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }
}

/// Where a resolved account came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountSource {
    /// Deterministic token-overlap match on search results
    #[serde(rename = "autocomplete")]
    Autocomplete,
    /// First search result taken without a confident match
    #[serde(rename = "autocomplete-fallback")]
    AutocompleteFallback,
    /// AI picked one of the search results
    #[serde(rename = "ai")]
    Ai,
    /// AI proposed a brand new account
    #[serde(rename = "ai-new")]
    AiNew,
}

impl AccountSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Autocomplete => "autocomplete",
            Self::AutocompleteFallback => "autocomplete-fallback",
            Self::Ai => "ai",
            Self::AiNew => "ai-new",
        }
    }
}

impl std::fmt::Display for AccountSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account that already exists in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingAccount {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: AccountSource,
}

impl ExistingAccount {
    pub fn from_candidate(candidate: &AccountCandidate, source: AccountSource) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            description: candidate.description.clone(),
            source,
        }
    }
}

/// An account the caller should create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub description: String,
    pub source: AccountSource,
}

/// The matcher's verdict for one transaction
///
/// Serializes as `{"decision": "existing"|"create", "account": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    Existing { account: ExistingAccount },
    Create { account: NewAccount },
}

impl Decision {
    pub fn existing(candidate: &AccountCandidate, source: AccountSource) -> Self {
        Decision::Existing {
            account: ExistingAccount::from_candidate(candidate, source),
        }
    }

    pub fn create(name: impl Into<String>, description: impl Into<String>) -> Self {
        Decision::Create {
            account: NewAccount {
                name: name.into(),
                description: description.into(),
                source: AccountSource::AiNew,
            },
        }
    }

    pub fn account_name(&self) -> &str {
        match self {
            Decision::Existing { account } => &account.name,
            Decision::Create { account } => &account.name,
        }
    }

    pub fn source(&self) -> AccountSource {
        match self {
            Decision::Existing { account } => account.source,
            Decision::Create { account } => account.source,
        }
    }

    /// Ledger id, only known for existing accounts
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Decision::Existing { account } => Some(&account.id),
            Decision::Create { .. } => None,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Decision::Create { .. })
    }
}
