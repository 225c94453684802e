//! Trait definitions for external interactions
//!
//! The text generator is the only non-deterministic, non-local dependency
//! of the pipeline. It is reached exclusively through [`ExtractionClient`];
//! implementations live in `riskextract-llm`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fully rendered prompt
    pub prompt: String,

    /// Model identifier understood by the provider
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationRequest {
    /// Create a new request
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature,
        }
    }
}

/// Typed failure of a generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Network trouble, rate limiting, timeouts - worth retrying
    #[error("Transient generation error: {0}")]
    Transient(String),

    /// Authentication, quota or model errors - retrying cannot help
    #[error("Permanent generation error: {0}")]
    Permanent(String),
}

impl GenerationError {
    /// Whether the failure may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Transient(_))
    }

    /// The error message without the classification prefix
    pub fn message(&self) -> &str {
        match self {
            GenerationError::Transient(msg) | GenerationError::Permanent(msg) => msg,
        }
    }
}

/// Trait for text generation backends
///
/// Implemented by the infrastructure layer (riskextract-llm). One instance
/// is shared by every concurrent chunk worker.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Generate a completion; makes exactly one attempt
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Human-readable backend name for logs and reports
    fn name(&self) -> &str {
        "client"
    }
}
