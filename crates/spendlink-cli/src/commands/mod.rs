//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared setup (config, ledger, AI backend, matcher) and output formatting
//! - `resolve` - Resolve a transaction text without touching the ledger
//! - `apply` - Resolve ledger transactions and update their destination accounts
//! - `check` - Connectivity checks
//! - `prompts` - Prompt library management commands

pub mod apply;
pub mod check;
pub mod core;
pub mod prompts;
pub mod resolve;

// Re-export command functions for main.rs
pub use apply::*;
pub use check::*;
pub use core::*;
pub use prompts::*;
pub use resolve::*;
