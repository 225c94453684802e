//! Metrics collection for extraction runs

use crate::types::DocumentExtraction;
use riskextract_domain::{DocumentCategory, IssueKind, IssueSummary};
use std::collections::BTreeMap;
use std::time::Duration;

/// Metrics collected during a corpus run
///
/// Tracks documents per category, chunk outcomes, generation attempts and
/// issues by kind.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    /// Completed documents per category
    pub documents: BTreeMap<DocumentCategory, usize>,

    /// Completed documents with no usable chunk
    pub fully_unresolved: usize,

    /// Documents abandoned on cancellation
    pub cancelled: usize,

    /// Documents that failed outright
    pub failed: usize,

    /// Chunks processed
    pub chunks: usize,

    /// Chunks whose record was rejected
    pub rejected_chunks: usize,

    /// Generation attempts across all chunks
    pub attempts: u64,

    /// Issues across all chunks
    pub issues: IssueSummary,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed document
    pub fn record_document(&mut self, extraction: &DocumentExtraction) {
        let record = &extraction.record;
        *self.documents.entry(record.category).or_insert(0) += 1;
        if record.is_fully_unresolved() {
            self.fully_unresolved += 1;
        }
        self.chunks += extraction.chunks.len();
        self.rejected_chunks += extraction.rejected_chunks().count();
        self.attempts += extraction
            .chunks
            .iter()
            .map(|c| u64::from(c.attempts))
            .sum::<u64>();
        self.issues.merge(&record.provenance.issues);
    }

    /// Record a cancelled document
    pub fn record_cancelled(&mut self) {
        self.cancelled += 1;
    }

    /// Record a failed document
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Get total completed documents across all categories
    pub fn total_documents(&self) -> usize {
        self.documents.values().sum()
    }

    /// Chunks that exhausted their retry budget
    pub fn exhausted_chunks(&self) -> usize {
        self.issues.get(IssueKind::ExhaustedRetries)
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Extraction Summary".to_string(),
            "==================".to_string(),
            format!("Documents: {}", self.total_documents()),
            format!("Fully unresolved: {}", self.fully_unresolved),
            format!("Cancelled: {}", self.cancelled),
            format!("Failed: {}", self.failed),
            format!(
                "Chunks: {} ({} rejected)",
                self.chunks, self.rejected_chunks
            ),
            format!("Generation attempts: {}", self.attempts),
            format!("Elapsed: {:.1}s", self.elapsed.as_secs_f64()),
            String::new(),
        ];

        if !self.documents.is_empty() {
            lines.push("Documents by category:".to_string());
            for (category, count) in &self.documents {
                lines.push(format!("  {}: {}", category, count));
            }
            lines.push(String::new());
        }

        lines.push("Issues by kind:".to_string());
        if self.issues.is_empty() {
            lines.push("  none".to_string());
        } else {
            for (kind, count) in self.issues.iter() {
                lines.push(format!("  {}: {}", kind.as_str(), count));
            }
            lines.push(format!("  Total: {}", self.issues.total()));
        }

        lines.join("\n")
    }
}
