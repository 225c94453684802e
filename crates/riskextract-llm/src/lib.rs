//! Riskextract LLM Provider Layer
//!
//! Implementations of the `ExtractionClient` trait from `riskextract-domain`.
//!
//! # Architecture
//!
//! Every provider makes exactly one attempt per call and classifies its
//! failures as transient or permanent. Retrying, backoff and timeouts are
//! owned by the extractor's retry state machine, so providers stay simple
//! and their behaviour is identical under test.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted responses for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiCompatProvider`: Hosted chat-completions APIs (OpenAI, Groq, OpenRouter)
//!
//! # Examples
//!
//! ```
//! use riskextract_llm::MockProvider;
//! use riskextract_domain::{ExtractionClient, GenerationRequest};
//!
//! # tokio_test_block_on(async {
//! let provider = MockProvider::new(r#"{"region": "europe"}"#);
//! let request = GenerationRequest::new("any prompt", "test-model", 0.0);
//! let result = provider.generate(&request).await.unwrap();
//! assert_eq!(result, r#"{"region": "europe"}"#);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod mock;
pub mod ollama;
pub mod openai;

use riskextract_domain::GenerationError;
use thiserror::Error;

pub use mock::{MockOutcome, MockProvider};
pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider-side failure (HTTP 5xx)
    #[error("Server error (HTTP {0}): {1}")]
    Server(u16, String),

    /// Credentials missing or refused
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Account quota or billing limit reached
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request refused as invalid (other HTTP 4xx)
    #[error("Bad request (HTTP {0}): {1}")]
    BadRequest(u16, String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => LlmError::Authentication(body),
            402 => LlmError::QuotaExceeded(body),
            404 => LlmError::ModelNotAvailable(model.to_string()),
            408 => LlmError::Timeout,
            429 => LlmError::RateLimitExceeded,
            500..=599 => LlmError::Server(status, body),
            _ => LlmError::BadRequest(status, body),
        }
    }

    /// Whether the failure may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Timeout
                | LlmError::RateLimitExceeded
                | LlmError::Server(_, _)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        if e.is_transient() {
            GenerationError::Transient(e.to_string())
        } else {
            GenerationError::Permanent(e.to_string())
        }
    }
}
