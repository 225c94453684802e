//! Riskextract Extractor
//!
//! Turns raw document text into one consolidated, schema-conformant record
//! per document.
//!
//! # Architecture
//!
//! ```text
//! Document → Chunker → PromptBuilder → ExtractionClient → Gatekeeper → Reducer → ConsolidatedRecord
//!               (n chunks, concurrent, bounded by a shared semaphore)
//! ```
//!
//! # Key Features
//!
//! - **Sliding-window chunking** over character offsets
//! - **Deterministic prompts** rendered from the shared contract
//! - **Bounded retry** with exponential backoff and per-attempt timeout
//! - **Failure containment**: generation and validation failures become
//!   rejected chunk records, never document errors
//! - **Cancellation**: a cancelled document is never reduced
//!
//! # Example Usage
//!
//! ```no_run
//! use riskextract_domain::{Document, DocumentCategory, ExtractionContract};
//! use riskextract_extractor::{Extractor, ExtractorConfig};
//! use riskextract_llm::MockProvider;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MockProvider::new(r#"{"entity_name": "Acme Re", "region": "europe"}"#);
//! let extractor = Extractor::new(client, ExtractionContract::risk_profile(), ExtractorConfig::default())?;
//!
//! let document = Document::new("acme_policy", DocumentCategory::Policy, "Acme Re ...");
//! let result = extractor.extract_document(&document, &CancellationToken::new()).await?;
//!
//! println!("{:?}", result.record.get("region"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod pipeline;
mod prompt;
mod report;
mod retry;
mod types;


pub use chunking::{Chunker, Chunks};
pub use config::{ChunkingConfig, ExtractorConfig, GenerationSettings, RetryPolicy};
pub use error::ExtractorError;
pub use pipeline::Extractor;
pub use prompt::PromptBuilder;
pub use report::RunMetrics;
pub use retry::{generate_with_retry, Failure, RetryEvent, RetryOutcome, RetryState};
pub use types::{CorpusExtraction, DocumentExtraction, DocumentFailure};
