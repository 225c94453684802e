//! Result types for extraction runs

use crate::report::RunMetrics;
use riskextract_domain::{ChunkExtractionRecord, ConsolidatedRecord};

/// Everything produced for one document
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    /// The consolidated record
    pub record: ConsolidatedRecord,

    /// Per-chunk records, chunk order
    pub chunks: Vec<ChunkExtractionRecord>,
}

impl DocumentExtraction {
    /// Source document id
    pub fn document_id(&self) -> &str {
        &self.record.document_id
    }

    /// Chunk records that were rejected
    pub fn rejected_chunks(&self) -> impl Iterator<Item = &ChunkExtractionRecord> {
        self.chunks.iter().filter(|r| !r.is_usable())
    }
}

/// A document that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Document id
    pub document_id: String,

    /// Why it failed
    pub error: String,
}

/// Result of a corpus run
#[derive(Debug, Clone, Default)]
pub struct CorpusExtraction {
    /// Completed documents, input order
    pub documents: Vec<DocumentExtraction>,

    /// Documents abandoned because the run was cancelled, input order
    pub cancelled: Vec<String>,

    /// Documents that failed outright, input order
    pub failed: Vec<DocumentFailure>,

    /// Counters for the whole run
    pub metrics: RunMetrics,
}

impl CorpusExtraction {
    /// Consolidated records, input order
    pub fn records(&self) -> impl Iterator<Item = &ConsolidatedRecord> {
        self.documents.iter().map(|d| &d.record)
    }

    /// Whether every document completed
    pub fn is_complete(&self) -> bool {
        self.cancelled.is_empty() && self.failed.is_empty()
    }
}
