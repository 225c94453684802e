//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Extraction pipeline error
    #[error("Extraction error: {0}")]
    Extractor(#[from] riskextract_extractor::ExtractorError),

    /// Schema or vocabulary error
    #[error("Schema error: {0}")]
    Schema(#[from] riskextract_domain::SchemaError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
