//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use clap::Parser;
use spendlink_core::test_utils::InMemoryLedger;
use spendlink_core::{
    AccountCandidate, AccountSource, Decision, ExpenseAccountMatcher, MatcherConfig, MockBackend,
    PromptLibrary,
};

use crate::cli::{Cli, Commands, PromptsAction};
use crate::commands::{self, BatchSummary};

const BAR_PEPE: &str =
    r#"{"decision":"create","account":{"name":"Bar Pepe","description":"Neighbourhood bar"}}"#;

fn test_matcher(
    search: InMemoryLedger,
    ai: MockBackend,
) -> ExpenseAccountMatcher<InMemoryLedger, MockBackend> {
    ExpenseAccountMatcher::with_prompts(
        search,
        ai,
        MatcherConfig::default(),
        PromptLibrary::embedded_only(),
    )
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_resolve() {
    let cli = Cli::try_parse_from([
        "spendlink",
        "resolve",
        "-d",
        "COMPRA EN STARBUCKS",
        "--destination",
        "Starbucks",
        "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::Resolve {
            description,
            destination,
            json,
        } => {
            assert_eq!(description, "COMPRA EN STARBUCKS");
            assert_eq!(destination.as_deref(), Some("Starbucks"));
            assert!(json);
        }
        _ => panic!("expected resolve"),
    }
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli =
        Cli::try_parse_from(["spendlink", "apply", "42", "43", "--config", "m.toml", "-v"]).unwrap();

    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("m.toml")));
    match cli.command {
        Commands::Apply { ids } => assert_eq!(ids, vec!["42", "43"]),
        _ => panic!("expected apply"),
    }
}

#[test]
fn test_apply_requires_ids() {
    assert!(Cli::try_parse_from(["spendlink", "apply"]).is_err());
}

#[test]
fn test_parse_prompts_show() {
    let cli = Cli::try_parse_from(["spendlink", "prompts", "show", "create_expense_account"]).unwrap();
    match cli.command {
        Commands::Prompts {
            action: Some(PromptsAction::Show { id }),
        } => assert_eq!(id, "create_expense_account"),
        _ => panic!("expected prompts show"),
    }
}

// ========== Output Tests ==========

#[test]
fn test_format_decision() {
    let existing = Decision::existing(
        &AccountCandidate::new("9", "Starbucks Coffee"),
        AccountSource::Autocomplete,
    );
    assert_eq!(
        commands::format_decision(&existing),
        "existing  Starbucks Coffee (id 9, autocomplete)"
    );

    assert_eq!(
        commands::format_decision(&Decision::create("Bar Pepe", "")),
        "create    Bar Pepe (ai-new)"
    );
    assert_eq!(
        commands::format_decision(&Decision::create("Bar Pepe", "Neighbourhood bar")),
        "create    Bar Pepe (ai-new): Neighbourhood bar"
    );
}

#[tokio::test]
async fn test_resolve_output_json() {
    let matcher = test_matcher(
        InMemoryLedger::new().with_account("9", "Starbucks Coffee"),
        MockBackend::new(),
    );

    let output = commands::resolve_output(&matcher, "COMPRA EN STARBUCKS 1234", None, true)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["decision"], "existing");
    assert_eq!(json["account"]["id"], "9");
    assert_eq!(json["account"]["source"], "autocomplete");
}

#[tokio::test]
async fn test_resolve_output_propagates_invalid_input() {
    let matcher = test_matcher(InMemoryLedger::new(), MockBackend::new());
    let result = commands::resolve_output(&matcher, "  ", None, false).await;
    assert!(result.is_err());
}

// ========== Apply Command Tests ==========

#[tokio::test]
async fn test_apply_batch_continues_after_failure() {
    let ledger = InMemoryLedger::new()
        .with_transaction("1", "COMPRA EN BAR PEPE 4412", None)
        .with_transaction("3", "compra en bar pepe 9981", None);
    let ai = MockBackend::new().with_reply(BAR_PEPE);
    let matcher = test_matcher(InMemoryLedger::new(), ai.clone());

    let ids: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
    let summary = commands::apply_batch(&ledger, &matcher, &ids).await;

    assert_eq!(
        summary,
        BatchSummary {
            succeeded: 2,
            failed: vec!["2".to_string()],
        }
    );
    assert_eq!(ai.calls(), 1);
    assert_eq!(ledger.created_accounts(), vec!["Bar Pepe"]);
    assert_eq!(ledger.destination_of("1"), ledger.destination_of("3"));
}

#[tokio::test]
async fn test_apply_batch_ai_failure_is_reported() {
    let ledger = InMemoryLedger::new().with_transaction("1", "MYSTERY SHOP", None);
    let ai = MockBackend::new().with_transport_error("connection refused");
    let matcher = test_matcher(InMemoryLedger::new(), ai);

    let summary = commands::apply_batch(&ledger, &matcher, &["1".to_string()]).await;
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, vec!["1"]);
    assert_eq!(ledger.destination_of("1"), None);
}

// ========== Prompts Command Tests ==========

#[test]
fn test_cmd_prompts_show_known_and_unknown() {
    assert!(commands::cmd_prompts_show("select_expense_account").is_ok());
    assert!(commands::cmd_prompts_show("classify_merchant").is_err());
}
