//! OpenAI-compatible chat completions provider
//!
//! Works against any service exposing `POST {base}/chat/completions`
//! (OpenAI, Groq, OpenRouter, vLLM).

use crate::LlmError;
use async_trait::async_trait;
use riskextract_domain::{ExtractionClient, GenerationError, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Groq's OpenAI-compatible endpoint
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// System message sent ahead of every prompt
pub const SYSTEM_MESSAGE: &str = "You are a JSON extraction assistant.";

const TIMEOUT_SECS: u64 = 300;

/// Provider for hosted chat-completions APIs
pub struct OpenAiCompatProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    json_mode: bool,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatProvider {
    /// Create a provider for `endpoint` (the API base, without `/chat/completions`)
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            json_mode: true,
            client,
        }
    }

    /// Authenticate with a bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Request `response_format: json_object` (on by default)
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    /// Make one chat completion call
    pub async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = self.build_body(request);

        debug!("POST {} (model {})", url, body.model);
        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status.as_u16(), text, body.model));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))
    }
}

#[async_trait]
impl ExtractionClient for OpenAiCompatProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.complete(request).await.map_err(GenerationError::from)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}
