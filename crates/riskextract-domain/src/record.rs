//! Per-chunk and per-document extraction records

use crate::document::{ChunkId, DocumentCategory};
use crate::value::FieldValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of validating one generator completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Every field passed validation as emitted
    Accepted,

    /// Usable, but at least one field was replaced by the sentinel
    Repaired,

    /// Not usable; excluded from reduction
    Rejected,
}

impl ValidationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Accepted => "accepted",
            ValidationStatus::Repaired => "repaired",
            ValidationStatus::Rejected => "rejected",
        }
    }
}

/// A problem found while producing a chunk record
///
/// All issues are contained at the record level; none aborts a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// Output was not a single JSON object
    MalformedOutput(String),

    /// A required field was absent and set to the sentinel
    MissingField(String),

    /// A value had the wrong type or was outside its vocabulary
    InvalidValue {
        /// Field name
        field: String,
        /// The offending value as emitted
        given: String,
    },

    /// A key outside the schema was emitted and dropped
    UnexpectedField(String),

    /// The object parsed but no field passed validation
    NoUsableFields,

    /// Transient generation failures used up the retry budget
    ExhaustedRetries {
        /// Attempts made
        attempts: u32,
        /// Last transient error message
        last_error: String,
    },

    /// Generation failed permanently (authentication, quota, model)
    GenerationFailed(String),
}

impl ValidationIssue {
    /// The issue's kind, for counting
    pub fn kind(&self) -> IssueKind {
        match self {
            ValidationIssue::MalformedOutput(_) => IssueKind::MalformedOutput,
            ValidationIssue::MissingField(_) => IssueKind::MissingField,
            ValidationIssue::InvalidValue { .. } => IssueKind::InvalidValue,
            ValidationIssue::UnexpectedField(_) => IssueKind::UnexpectedField,
            ValidationIssue::NoUsableFields => IssueKind::NoUsableFields,
            ValidationIssue::ExhaustedRetries { .. } => IssueKind::ExhaustedRetries,
            ValidationIssue::GenerationFailed(_) => IssueKind::GenerationFailed,
        }
    }

    /// The schema field this issue repaired, if any
    pub fn repaired_field(&self) -> Option<&str> {
        match self {
            ValidationIssue::MissingField(field) => Some(field),
            ValidationIssue::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MalformedOutput(detail) => write!(f, "malformed output: {}", detail),
            ValidationIssue::MissingField(field) => write!(f, "missing field '{}'", field),
            ValidationIssue::InvalidValue { field, given } => {
                write!(f, "invalid value for '{}': {}", field, given)
            }
            ValidationIssue::UnexpectedField(field) => write!(f, "unexpected field '{}'", field),
            ValidationIssue::NoUsableFields => write!(f, "no usable fields"),
            ValidationIssue::ExhaustedRetries { attempts, last_error } => {
                write!(f, "exhausted retries after {} attempts: {}", attempts, last_error)
            }
            ValidationIssue::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
        }
    }
}

/// Kind of a [`ValidationIssue`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// See [`ValidationIssue::MalformedOutput`]
    MalformedOutput,
    /// See [`ValidationIssue::MissingField`]
    MissingField,
    /// See [`ValidationIssue::InvalidValue`]
    InvalidValue,
    /// See [`ValidationIssue::UnexpectedField`]
    UnexpectedField,
    /// See [`ValidationIssue::NoUsableFields`]
    NoUsableFields,
    /// See [`ValidationIssue::ExhaustedRetries`]
    ExhaustedRetries,
    /// See [`ValidationIssue::GenerationFailed`]
    GenerationFailed,
}

impl IssueKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MalformedOutput => "malformed_output",
            IssueKind::MissingField => "missing_field",
            IssueKind::InvalidValue => "invalid_value",
            IssueKind::UnexpectedField => "unexpected_field",
            IssueKind::NoUsableFields => "no_usable_fields",
            IssueKind::ExhaustedRetries => "exhausted_retries",
            IssueKind::GenerationFailed => "generation_failed",
        }
    }
}

/// Validated extraction for one chunk
///
/// Created once by the validator (or by the pipeline for chunks whose
/// generation failed) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkExtractionRecord {
    /// Source chunk
    pub chunk: ChunkId,

    /// Final status
    pub status: ValidationStatus,

    /// Field values, schema order; empty for rejected records
    pub fields: IndexMap<String, FieldValue>,

    /// Issues encountered, in the order found
    pub issues: Vec<ValidationIssue>,

    /// Generation attempts spent on this chunk
    pub attempts: u32,
}

impl ChunkExtractionRecord {
    /// A rejected record carrying a single issue
    pub fn rejected(chunk: ChunkId, issue: ValidationIssue, attempts: u32) -> Self {
        Self {
            chunk,
            status: ValidationStatus::Rejected,
            fields: IndexMap::new(),
            issues: vec![issue],
            attempts,
        }
    }

    /// Whether the record may contribute to reduction
    pub fn is_usable(&self) -> bool {
        self.status != ValidationStatus::Rejected
    }

    /// Value of a field, if present
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Copy of this record with the attempt count replaced
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// Count of issues by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueSummary {
    counts: BTreeMap<IssueKind, usize>,
}

impl IssueSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one issue
    pub fn record(&mut self, issue: &ValidationIssue) {
        *self.counts.entry(issue.kind()).or_insert(0) += 1;
    }

    /// Count every issue of every record
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ChunkExtractionRecord>,
    {
        let mut summary = Self::new();
        for record in records {
            for issue in &record.issues {
                summary.record(issue);
            }
        }
        summary
    }

    /// Add another summary into this one
    pub fn merge(&mut self, other: &IssueSummary) {
        for (kind, count) in &other.counts {
            *self.counts.entry(*kind).or_insert(0) += count;
        }
    }

    /// Count for one kind
    pub fn get(&self, kind: IssueKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total issues counted
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Whether nothing was counted
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate `(kind, count)` in kind order
    pub fn iter(&self) -> impl Iterator<Item = (IssueKind, usize)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl fmt::Display for IssueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("none");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(kind, count)| format!("{}={}", kind.as_str(), count))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// How a consolidated field value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// All contributors agreed
    Unanimous,
    /// A strict majority (or plurality) won the vote
    Majority,
    /// The vote was tied and the tie-break rule decided
    TieBreak,
    /// List entries were merged
    Union,
    /// Numbers were aggregated (max, min, mean or sum)
    Aggregate,
    /// The first contributor was taken
    First,
    /// Texts were concatenated
    Concatenated,
    /// No contributor had a value
    Unresolved,
}

/// Provenance of one consolidated field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProvenance {
    /// Records that supplied a non-sentinel value
    pub contributors: usize,

    /// Distinct non-sentinel values seen (after normalization)
    pub distinct_values: usize,

    /// How the value was resolved
    pub resolution: Resolution,
}

/// Audit metadata attached to a consolidated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Non-rejected chunk records that were reduced
    pub contributing_chunks: usize,

    /// Chunks the document was split into
    pub total_chunks: usize,

    /// No chunk yielded a usable record
    pub fully_unresolved: bool,

    /// Fields where differing values had to be discarded
    pub conflicted_fields: Vec<String>,

    /// Fields repaired in at least one contributing record
    pub repaired_fields: Vec<String>,

    /// Per-field details, schema order
    pub fields: IndexMap<String, FieldProvenance>,

    /// Issues across all chunk records of the document
    pub issues: IssueSummary,
}

/// The single canonical record for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    /// Source document id
    pub document_id: String,

    /// Source document category
    pub category: DocumentCategory,

    /// Exactly one value per schema field, schema order
    pub fields: IndexMap<String, FieldValue>,

    /// Audit metadata
    pub provenance: Provenance,
}

impl ConsolidatedRecord {
    /// Value of a field
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Whether no chunk contributed
    pub fn is_fully_unresolved(&self) -> bool {
        self.provenance.fully_unresolved
    }
}
