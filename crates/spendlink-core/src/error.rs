//! Error types for spendlink

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The completion backend could not be reached or refused the request
    #[error("AI backend error ({backend}): {message}")]
    AiTransport { backend: String, message: String },

    /// The completion backend answered, but not with a usable decision
    #[error("Invalid AI response: {0}")]
    AiProtocol(String),

    #[error("Ledger error (status {}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "n/a".into()))]
    Ledger {
        status: Option<u16>,
        message: String,
    },

    /// The ledger already holds an account with this name
    #[error("Account already exists: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Wrap a transport-level failure from a named completion backend
    pub fn ai_transport(backend: &str, message: impl std::fmt::Display) -> Self {
        Error::AiTransport {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    /// Wrap a transport-level failure from the ledger API
    pub fn ledger(status: Option<u16>, message: impl std::fmt::Display) -> Self {
        Error::Ledger {
            status,
            message: message.to_string(),
        }
    }

    pub fn is_ai_protocol(&self) -> bool {
        matches!(self, Error::AiProtocol(_))
    }

    pub fn is_ai_transport(&self) -> bool {
        matches!(self, Error::AiTransport { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(Error::AiProtocol("bad".into()).is_ai_protocol());
        assert!(Error::ai_transport("ollama", "connection refused").is_ai_transport());
        assert!(Error::Conflict("Starbucks".into()).is_conflict());
        assert!(!Error::InvalidInput("x".into()).is_conflict());
    }

    #[test]
    fn test_ledger_error_display() {
        let err = Error::ledger(Some(500), "boom");
        assert_eq!(err.to_string(), "Ledger error (status 500): boom");

        let err = Error::ledger(None, "timeout");
        assert_eq!(err.to_string(), "Ledger error (status n/a): timeout");
    }
}
