//! REST ledger client
//!
//! Speaks the Firefly III style API:
//! - `GET  /api/v1/autocomplete/accounts?query=..&limit=..&types=Expense account`
//! - `POST /api/v1/accounts`
//! - `GET  /api/v1/transactions/{id}`
//! - `PUT  /api/v1/transactions/{id}`
//!
//! # Configuration
//!
//! Environment variables:
//! - `LEDGER_URL`: Ledger base URL (required)
//! - `LEDGER_TOKEN`: Personal access token (required)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::matcher::AccountCandidate;

use super::{AccountSearch, LedgerClient, LedgerTransaction, NewAccountRequest};

/// Autocomplete type filter for expense accounts
const EXPENSE_ACCOUNT_TYPE: &str = "Expense account";

/// Connection settings for [`HttpLedger`]
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub base_url: String,
    pub token: String,
}

impl LedgerConfig {
    /// Read `LEDGER_URL` and `LEDGER_TOKEN`; None if either is missing
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("LEDGER_URL").ok()?;
        let token = std::env::var("LEDGER_TOKEN").ok()?;
        Some(Self { base_url, token })
    }
}

/// HTTP ledger client
#[derive(Clone)]
pub struct HttpLedger {
    http_client: Client,
    base_url: String,
    token: String,
}

impl HttpLedger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|e| Error::ledger(None, e))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::ledger(Some(status.as_u16()), body))
    }

    /// Check the ledger answers authenticated requests
    pub async fn health_check(&self) -> bool {
        self.send(self.request(reqwest::Method::GET, "/api/v1/about"))
            .await
            .is_ok()
    }
}

/// Autocomplete entry
#[derive(Debug, Deserialize)]
struct AutocompleteAccount {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateAccountBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    account_type: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    notes: &'a str,
}

#[derive(Debug, Deserialize)]
struct SingleResource<T> {
    data: Resource<T>,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    id: String,
    attributes: T,
}

#[derive(Debug, Deserialize)]
struct TransactionGroupAttributes {
    transactions: Vec<TransactionSplit>,
}

#[derive(Debug, Deserialize)]
struct TransactionSplit {
    description: String,
    #[serde(default)]
    destination_name: Option<String>,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateTransactionBody<'a> {
    apply_rules: bool,
    transactions: Vec<UpdateSplit<'a>>,
}

#[derive(Debug, Serialize)]
struct UpdateSplit<'a> {
    destination_id: &'a str,
}

/// Validation error body returned with 422
#[derive(Debug, Deserialize)]
struct ValidationErrors {
    #[serde(default)]
    errors: HashMap<String, Value>,
}

/// Whether a failed account creation means "name already taken".
///
/// 409 always does; 422 only when the validation errors are keyed on `name`.
fn is_name_conflict(status: u16, body: &str) -> bool {
    if status == StatusCode::CONFLICT.as_u16() {
        return true;
    }
    if status != StatusCode::UNPROCESSABLE_ENTITY.as_u16() {
        return false;
    }
    serde_json::from_str::<ValidationErrors>(body)
        .map(|v| v.errors.contains_key("name"))
        .unwrap_or(false)
}

/// Ledger dates come as RFC 3339 timestamps; only the calendar day matters
fn parse_ledger_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

#[async_trait]
impl AccountSearch for HttpLedger {
    async fn search_expense_accounts(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AccountCandidate>> {
        let limit = limit.to_string();
        let builder = self
            .request(reqwest::Method::GET, "/api/v1/autocomplete/accounts")
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("types", EXPENSE_ACCOUNT_TYPE),
            ]);

        let accounts: Vec<AutocompleteAccount> = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| Error::ledger(None, format!("Unreadable autocomplete response: {}", e)))?;

        debug!(query = %query, count = accounts.len(), "Ledger autocomplete");

        Ok(accounts
            .into_iter()
            .map(|a| AccountCandidate {
                id: a.id,
                name: a.name,
                description: a.description.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl LedgerClient for HttpLedger {
    async fn create_account(&self, request: &NewAccountRequest) -> Result<String> {
        let body = CreateAccountBody {
            name: &request.name,
            account_type: request.account_type.as_str(),
            notes: &request.notes,
        };

        let builder = self
            .request(reqwest::Method::POST, "/api/v1/accounts")
            .json(&body);

        let response = match self.send(builder).await {
            Ok(response) => response,
            Err(Error::Ledger {
                status: Some(status),
                message,
            }) if is_name_conflict(status, &message) => {
                return Err(Error::Conflict(request.name.clone()));
            }
            Err(e) => return Err(e),
        };

        let created: SingleResource<Value> = response
            .json()
            .await
            .map_err(|e| Error::ledger(None, format!("Unreadable account response: {}", e)))?;
        Ok(created.data.id)
    }

    async fn get_transaction(&self, id: &str) -> Result<LedgerTransaction> {
        let builder = self.request(reqwest::Method::GET, &format!("/api/v1/transactions/{}", id));

        let response = match self.send(builder).await {
            Err(Error::Ledger {
                status: Some(404), ..
            }) => return Err(Error::NotFound(format!("transaction {}", id))),
            other => other?,
        };

        let group: SingleResource<TransactionGroupAttributes> = response
            .json()
            .await
            .map_err(|e| Error::ledger(None, format!("Unreadable transaction response: {}", e)))?;

        let split = group
            .data
            .attributes
            .transactions
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidData(format!("transaction {} has no splits", id)))?;

        Ok(LedgerTransaction {
            id: group.data.id,
            description: split.description,
            destination_name: split.destination_name,
            amount: split.amount,
            date: split.date.as_deref().and_then(parse_ledger_date),
        })
    }

    async fn set_destination_account(&self, transaction_id: &str, account_id: &str) -> Result<()> {
        let body = UpdateTransactionBody {
            apply_rules: false,
            transactions: vec![UpdateSplit {
                destination_id: account_id,
            }],
        };

        let builder = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/v1/transactions/{}", transaction_id),
            )
            .json(&body);

        self.send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_conflict_detection() {
        assert!(is_name_conflict(409, ""));
        assert!(is_name_conflict(
            422,
            r#"{"message": "The given data was invalid.", "errors": {"name": ["This account name is already in use."]}}"#
        ));
        assert!(!is_name_conflict(
            422,
            r#"{"message": "The given data was invalid.", "errors": {"iban": ["Invalid IBAN."]}}"#
        ));
        assert!(!is_name_conflict(422, "not json"));
        assert!(!is_name_conflict(500, r#"{"errors": {"name": []}}"#));
    }

    #[test]
    fn test_parse_ledger_date() {
        assert_eq!(
            parse_ledger_date("2024-03-15T00:00:00+01:00"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_ledger_date("2024-03-15"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(parse_ledger_date("yesterday"), None);
    }

    #[test]
    fn test_transaction_group_deserializes() {
        let raw = r#"{"data": {"type": "transactions", "id": "42", "attributes": {"transactions": [
            {"description": "COMPRA EN STARBUCKS", "destination_name": "Starbucks", "amount": "4.50", "date": "2024-03-15T00:00:00+01:00"}
        ]}}}"#;
        let group: SingleResource<TransactionGroupAttributes> = serde_json::from_str(raw).unwrap();
        assert_eq!(group.data.id, "42");
        assert_eq!(group.data.attributes.transactions[0].amount, "4.50");
    }

    #[test]
    fn test_create_body_shape() {
        let body = CreateAccountBody {
            name: "Starbucks",
            account_type: "expense",
            notes: "",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "expense");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_base_url_trimmed() {
        let ledger = HttpLedger::new(&LedgerConfig {
            base_url: "https://ledger.local/".into(),
            token: "t".into(),
        });
        assert_eq!(ledger.host(), "https://ledger.local");
    }
}
