//! Error types for the Extractor

use riskextract_synthesizer::ReducerError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Generation and validation failures never surface here: they are
/// contained in `rejected` chunk records.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled before the document completed
    #[error("Extraction cancelled")]
    Cancelled,

    /// A worker task failed
    #[error("Task error: {0}")]
    Task(String),
}

impl From<ReducerError> for ExtractorError {
    fn from(e: ReducerError) -> Self {
        ExtractorError::Config(e.to_string())
    }
}
