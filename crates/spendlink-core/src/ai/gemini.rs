//! Google Gemini backend implementation
//!
//! Uses the `generateContent` REST endpoint. Sampling options travel in
//! `generationConfig`, where the token limit is called `maxOutputTokens`.
//! The API key travels in the `x-goog-api-key` header, never in the URL.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_API_KEY`: API key (required)
//! - `GEMINI_MODEL`: Model name (default: gemini-1.5-flash)
//! - `GEMINI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::CompletionOptions;
use super::AIBackend;

const BACKEND_NAME: &str = "gemini";
const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend against the public API
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_host(DEFAULT_HOST, api_key, model)
    }

    /// Create a backend against a custom host (proxies, tests)
    pub fn with_host(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `GEMINI_API_KEY`
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Some(Self::with_host(&host, &api_key, &model))
    }

    fn build_request(prompt: &str, options: &CompletionOptions) -> GenerateContentRequest {
        let generation_config = if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
        }
    }
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = Self::build_request(prompt, options);

        let response = self
            .http_client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ai_transport(BACKEND_NAME, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ai_transport(
                BACKEND_NAME,
                format!("API error {}: {}", status, body),
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::AiProtocol(format!("Unreadable Gemini response: {}", e)))?;

        let text = parsed
            .text()
            .ok_or_else(|| Error::AiProtocol("Empty response from Gemini API".into()))?;

        debug!("Gemini response: {}", text);
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1beta/models", self.base_url))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_naming() {
        let body = serde_json::to_value(GeminiBackend::build_request(
            "hi",
            &CompletionOptions::new(0.2, 128),
        ))
        .unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 128);
        assert!(body["generationConfig"]["temperature"].as_f64().is_some());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_generation_config_omitted_without_options() {
        let body =
            serde_json::to_value(GeminiBackend::build_request("hi", &CompletionOptions::default()))
                .unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let raw = r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_api_key() {
        // Bind then drop a listener so the port refuses connections
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend =
            GeminiBackend::with_host(&format!("http://{}", addr), "SECRET-KEY-123", "m");
        let err = backend
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_ai_transport());
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!backend.health_check().await);
    }

    #[test]
    fn test_response_without_candidates() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.text().is_none());
    }
}
