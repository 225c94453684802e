//! Configuration for the Extractor

use crate::ExtractorError;
use riskextract_gatekeeper::ValidationConfig;
use riskextract_synthesizer::ReducerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sliding-window chunking parameters, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Characters per window
    pub window_size: usize,

    /// Characters shared by consecutive windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: 2_000,
            overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Create a chunking configuration
    pub fn new(window_size: usize, overlap: usize) -> Self {
        Self {
            window_size,
            overlap,
        }
    }

    /// Distance between consecutive window starts
    pub fn step(&self) -> usize {
        self.window_size.saturating_sub(self.overlap)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.window_size == 0 {
            return Err(ExtractorError::Config(
                "window_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.window_size {
            return Err(ExtractorError::Config(format!(
                "overlap ({}) must be smaller than window_size ({})",
                self.overlap, self.window_size
            )));
        }
        Ok(())
    }
}

/// Retry budget for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Generation attempts per chunk, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after each failed attempt
    pub multiplier: f64,

    /// Upper bound on any single delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Time allowed for one attempt (seconds); exceeding it counts as transient
    pub request_timeout_secs: u64,

    /// Extra requests issued when the output is not a JSON object
    pub malformed_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            multiplier: 2.0,
            max_backoff_ms: 8_000,
            request_timeout_secs: 120,
            malformed_retries: 1,
        }
    }
}

impl RetryPolicy {
    /// Get the per-attempt timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let delay = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.max_attempts == 0 {
            return Err(ExtractorError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ExtractorError::Config(
                "multiplier must be a finite number >= 1.0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model identifier understood by the provider
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "llama3-70b-8192".to_string(),
            temperature: 0.0,
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Generation calls in flight at once, across all documents
    pub max_concurrent_requests: usize,

    /// Documents processed at once
    pub max_concurrent_documents: usize,

    /// Window parameters
    pub chunking: ChunkingConfig,

    /// Retry budget per chunk
    pub retry: RetryPolicy,

    /// Model and sampling
    pub generation: GenerationSettings,

    /// Validator leniency
    pub validation: ValidationConfig,

    /// Consolidation rules
    pub reducer: ReducerConfig,
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            max_concurrent_documents: 2,
            chunking: ChunkingConfig::default(),
            retry: RetryPolicy::default(),
            generation: GenerationSettings::default(),
            validation: ValidationConfig::default(),
            reducer: ReducerConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller windows, short timeouts, more parallelism
    pub fn aggressive() -> Self {
        Self {
            max_concurrent_requests: 8,
            max_concurrent_documents: 4,
            chunking: ChunkingConfig::new(1_000, 100),
            retry: RetryPolicy {
                max_attempts: 2,
                request_timeout_secs: 60,
                malformed_retries: 0,
                ..RetryPolicy::default()
            },
            ..Self::default()
        }
    }

    /// Lenient preset: larger windows, patient retries, permissive validation
    pub fn lenient() -> Self {
        Self {
            max_concurrent_requests: 2,
            max_concurrent_documents: 1,
            chunking: ChunkingConfig::new(4_000, 400),
            retry: RetryPolicy {
                max_attempts: 5,
                max_backoff_ms: 30_000,
                request_timeout_secs: 300,
                malformed_retries: 2,
                ..RetryPolicy::default()
            },
            validation: ValidationConfig::permissive(),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.max_concurrent_requests == 0 {
            return Err(ExtractorError::Config(
                "max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_documents == 0 {
            return Err(ExtractorError::Config(
                "max_concurrent_documents must be greater than 0".to_string(),
            ));
        }
        if self.generation.model.trim().is_empty() {
            return Err(ExtractorError::Config("model must not be empty".to_string()));
        }
        self.chunking.validate()?;
        self.retry.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.window_size, 2_000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.generation.model, "llama3-70b-8192");
    }

    #[test]
    fn test_aggressive_config_is_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_lenient_config_is_valid() {
        let config = ExtractorConfig::lenient();
        assert!(config.validate().is_ok());
        assert!(config.validation.allow_scalar_lists);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let mut config = ExtractorConfig::default();
        config.chunking = ChunkingConfig::new(100, 100);
        assert!(matches!(config.validate(), Err(ExtractorError::Config(_))));

        config.chunking = ChunkingConfig::new(0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_retry_budget() {
        let mut config = ExtractorConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(8_000));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml(
            r#"
            max_concurrent_requests = 1

            [chunking]
            window_size = 500
            overlap = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrent_requests, 1);
        assert_eq!(config.chunking, ChunkingConfig::new(500, 100));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }
}
