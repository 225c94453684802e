//! Riskextract Domain Layer
//!
//! This crate contains the shared data contract of the extraction pipeline.
//! Every other crate depends on it; it depends on nothing but serialization
//! and error-derive helpers.
//!
//! ## Key Concepts
//!
//! - **Schema**: The closed, ordered set of fields a document record carries
//! - **Controlled Vocabulary**: Named sets of permissible values, matched after normalization
//! - **Chunk**: An overlapping window of a document's text, one generation request each
//! - **Chunk Extraction Record**: The validated output for one chunk
//! - **Consolidated Record**: The single per-document record produced by reduction
//!
//! ## Architecture
//!
//! - Pure data definitions and invariants only
//! - The text generator is reached through the [`traits::ExtractionClient`] trait
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod document;
pub mod error;
pub mod record;
pub mod schema;
pub mod traits;
pub mod value;
pub mod vocabulary;

// Re-exports for convenience
pub use contract::ExtractionContract;
pub use document::{Chunk, ChunkId, Document, DocumentCategory};
pub use error::SchemaError;
pub use record::{
    ChunkExtractionRecord, ConsolidatedRecord, FieldProvenance, IssueKind, IssueSummary,
    Provenance, Resolution, ValidationIssue, ValidationStatus,
};
pub use schema::{FieldSpec, FieldType, Schema};
pub use traits::{ExtractionClient, GenerationError, GenerationRequest};
pub use value::{FieldValue, UNKNOWN};
pub use vocabulary::{normalize, ControlledVocabulary, Vocabularies};
