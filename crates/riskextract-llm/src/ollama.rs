//! Ollama Provider Implementation
//!
//! Integration with Ollama's local generate API. Requests use Ollama's JSON
//! mode so the model is constrained to emit a single JSON object.
//!
//! # Examples
//!
//! ```no_run
//! use riskextract_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3");
//! ```

use crate::LlmError;
use async_trait::async_trait;
use riskextract_domain::{ExtractionClient, GenerationError, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Transport-level timeout; the extractor enforces its own per-attempt limit
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// `model` is used when a request does not name one.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }

    /// Create a provider against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Make one generate call
    pub async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };

        let body = OllamaGenerateRequest {
            model,
            prompt: &request.prompt,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        debug!("POST {} (model {})", url, model);
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status.as_u16(), text, model));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl ExtractionClient for OllamaProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.complete(request).await.map_err(GenerationError::from)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
