//! Documents and the chunks they are split into

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of source document
///
/// Categories describe where a document came from; prompts and the
/// schema are shared across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    /// Insurance policy wording
    Policy,
    /// ESG / sustainability report
    Esg,
    /// Incident or loss report
    Incident,
}

impl DocumentCategory {
    /// All categories, in display order
    pub const ALL: [DocumentCategory; 3] = [
        DocumentCategory::Policy,
        DocumentCategory::Esg,
        DocumentCategory::Incident,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Policy => "policy",
            DocumentCategory::Esg => "esg",
            DocumentCategory::Incident => "incident",
        }
    }

    /// Parse a category name, accepting common plural and report forms
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "policy" | "policies" => Some(DocumentCategory::Policy),
            "esg" | "esg_report" | "esg_reports" => Some(DocumentCategory::Esg),
            "incident" | "incidents" | "incident_report" | "incident_reports" => {
                Some(DocumentCategory::Incident)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document category: {}", s))
    }
}

/// A loaded source document
///
/// Immutable once loaded; the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document identifier (file stem for file-based input)
    pub id: String,

    /// Document category
    pub category: DocumentCategory,

    /// Full raw text
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(id: impl Into<String>, category: DocumentCategory, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            text: text.into(),
        }
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Identifier of a chunk: parent document plus sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId {
    /// Parent document id
    pub document_id: String,

    /// Zero-based position in the document's chunk sequence
    pub sequence: usize,
}

impl ChunkId {
    /// Create a chunk id
    pub fn new(document_id: impl Into<String>, sequence: usize) -> Self {
        Self {
            document_id: document_id.into(),
            sequence,
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document_id, self.sequence)
    }
}

/// A contiguous window of a document's text
///
/// Offsets count characters, not bytes: `start..end` is a half-open range
/// with `0 <= start < end <= document length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Parent document id
    pub document_id: String,

    /// Zero-based sequence index
    pub sequence: usize,

    /// First character offset (inclusive)
    pub start: usize,

    /// Last character offset (exclusive)
    pub end: usize,

    /// The text of `start..end`
    pub text: String,
}

impl Chunk {
    /// The chunk's identifier
    pub fn id(&self) -> ChunkId {
        ChunkId::new(self.document_id.clone(), self.sequence)
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the chunk covers no characters (never true for chunker output)
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!(DocumentCategory::parse("Policy"), Some(DocumentCategory::Policy));
        assert_eq!(DocumentCategory::parse("policies"), Some(DocumentCategory::Policy));
        assert_eq!(DocumentCategory::parse("ESG_reports"), Some(DocumentCategory::Esg));
        assert_eq!(
            DocumentCategory::parse("incident_reports"),
            Some(DocumentCategory::Incident)
        );
        assert!(DocumentCategory::parse("memo").is_none());
        assert!("memo".parse::<DocumentCategory>().is_err());
    }

    #[test]
    fn test_chunk_id_display_and_order() {
        let a = ChunkId::new("doc", 2);
        let b = ChunkId::new("doc", 10);
        assert_eq!(a.to_string(), "doc#2");
        assert!(a < b);
    }

    #[test]
    fn test_char_len_counts_characters() {
        let doc = Document::new("d", DocumentCategory::Esg, "Zürich ✓");
        assert_eq!(doc.char_len(), 8);
    }
}
