//! The extraction contract: schema plus vocabularies, validated together

use crate::error::SchemaError;
use crate::schema::{FieldSpec, Schema};
use crate::vocabulary::{ControlledVocabulary, Vocabularies};
use std::sync::Arc;

/// Schema and vocabularies, checked for consistency once
///
/// Built at process start and shared read-only (behind an `Arc`) by every
/// component invocation, so concurrent workers need no locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionContract {
    schema: Schema,
    vocabularies: Vocabularies,
}

impl ExtractionContract {
    /// Validate and bundle a schema with its vocabularies
    pub fn new(schema: Schema, vocabularies: Vocabularies) -> Result<Self, SchemaError> {
        schema.validate(&vocabularies)?;
        Ok(Self {
            schema,
            vocabularies,
        })
    }

    /// The default risk profile contract, wrapped for sharing
    pub fn risk_profile() -> Arc<Self> {
        Arc::new(Self {
            schema: Schema::risk_profile(),
            vocabularies: Vocabularies::risk_profile(),
        })
    }

    /// The schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All vocabularies
    pub fn vocabularies(&self) -> &Vocabularies {
        &self.vocabularies
    }

    /// The vocabulary bound to a field, if any
    pub fn vocabulary_for(&self, field: &FieldSpec) -> Option<&ControlledVocabulary> {
        field
            .vocabulary
            .as_deref()
            .and_then(|name| self.vocabularies.get(name))
    }
}
