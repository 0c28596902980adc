//! Check command: AI backend and ledger connectivity

use anyhow::{bail, Result};
use spendlink_core::{AIBackend, AIClient, HttpLedger, LedgerConfig};

pub async fn cmd_check() -> Result<()> {
    let mut problems = 0;

    match AIClient::from_env() {
        Some(ai) => {
            let healthy = ai.health_check().await;
            println!(
                "AI backend:  {} ({} at {}) {}",
                ai.name(),
                ai.model(),
                ai.host(),
                if healthy { "OK" } else { "UNREACHABLE" }
            );
            if !healthy {
                problems += 1;
            }
        }
        None => {
            println!("AI backend:  not configured (set AI_BACKEND and its variables)");
            problems += 1;
        }
    }

    match LedgerConfig::from_env() {
        Some(config) => {
            let ledger = HttpLedger::new(&config);
            let healthy = ledger.health_check().await;
            println!(
                "Ledger:      {} {}",
                ledger.host(),
                if healthy { "OK" } else { "UNREACHABLE" }
            );
            if !healthy {
                problems += 1;
            }
        }
        None => {
            println!("Ledger:      not configured (set LEDGER_URL and LEDGER_TOKEN)");
            problems += 1;
        }
    }

    if problems > 0 {
        bail!("{} check(s) failed", problems);
    }
    Ok(())
}
