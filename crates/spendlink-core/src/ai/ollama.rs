//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. Sampling options are passed in
//! the request's `options` map (`temperature`, `num_predict`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::CompletionOptions;
use super::AIBackend;

const BACKEND_NAME: &str = "ollama";

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    fn build_request(&self, prompt: &str, options: &CompletionOptions) -> OllamaRequest {
        let sampling = if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            })
        } else {
            None
        };

        OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: sampling,
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = self.build_request(prompt, options);

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
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

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| Error::AiProtocol(format!("Unreadable Ollama response: {}", e)))?;
        debug!("Ollama response: {}", ollama_response.response);

        if ollama_response.response.trim().is_empty() {
            return Err(Error::AiProtocol("Empty response from Ollama".into()));
        }
        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
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
