//! Spendlink CLI - Expense account matching for a personal ledger
//!
//! Usage:
//!   spendlink resolve -d "COMPRA EN STARBUCKS 1234"   Show the matched account
//!   spendlink apply 42 43                              Resolve and update ledger transactions
//!   spendlink check                                    Check AI backend and ledger
//!   spendlink prompts list                             List AI prompts

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Resolve {
            description,
            destination,
            json,
        } => {
            commands::cmd_resolve(
                cli.config.as_deref(),
                &description,
                destination.as_deref(),
                json,
            )
            .await
        }
        Commands::Apply { ids } => commands::cmd_apply(cli.config.as_deref(), &ids).await,
        Commands::Check => commands::cmd_check().await,
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
