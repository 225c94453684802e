//! Errors raised while loading the extraction contract

use thiserror::Error;

/// Errors in a schema or vocabulary definition
///
/// These are configuration errors: they surface once at load time and are
/// never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Schema has no fields at all
    #[error("Schema must declare at least one field")]
    Empty,

    /// A field was declared with an empty name
    #[error("Field name must not be empty")]
    EmptyFieldName,

    /// A field name appears more than once
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// A field references a vocabulary that was not supplied
    #[error("Field '{field}' references unknown vocabulary '{vocabulary}'")]
    UnknownVocabulary {
        /// Field declaring the reference
        field: String,
        /// Missing vocabulary name
        vocabulary: String,
    },

    /// An enum field was declared without a vocabulary
    #[error("Enum field '{0}' must name a vocabulary")]
    MissingVocabulary(String),

    /// A vocabulary was attached to a field type that cannot use one
    #[error("Field '{0}' of this type cannot be bound to a vocabulary")]
    VocabularyNotAllowed(String),

    /// A vocabulary has no values
    #[error("Vocabulary '{0}' is empty")]
    EmptyVocabulary(String),
}
