//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendlink - Resolve bank transactions to ledger expense accounts
#[derive(Parser)]
#[command(name = "spendlink")]
#[command(about = "AI-assisted expense account matching for your ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Matcher config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a transaction text to an expense account without changing the ledger
    Resolve {
        /// Transaction description as shown by the bank
        #[arg(short, long)]
        description: String,

        /// Destination (counterparty) name, if the bank provides one
        #[arg(long)]
        destination: Option<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve ledger transactions and point them at their expense accounts
    Apply {
        /// Ledger transaction IDs, processed one at a time
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Check AI backend and ledger connectivity
    Check,

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g. select_expense_account)
        id: String,
    },

    /// Show the override directory path
    Path,
}
