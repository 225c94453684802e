//! Extraction schema - the closed set of fields every record carries

use crate::error::SchemaError;
use crate::vocabulary::Vocabularies;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text
    Text,
    /// A single value from a controlled vocabulary
    Enum,
    /// A list of strings, optionally restricted to a vocabulary
    List,
    /// A real number (reduced by maximum unless configured otherwise)
    Number,
    /// A non-negative integer count (reduced by summing)
    Count,
}

impl FieldType {
    /// Get the type name as used in configuration and prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Enum => "enum",
            FieldType::List => "list",
            FieldType::Number => "number",
            FieldType::Count => "count",
        }
    }

    /// Whether values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Count)
    }
}

/// One field of the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, also the JSON key the generator must emit
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Vocabulary restricting the values (required for `enum`, optional for `list`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<String>,

    /// Whether absence from the generator output is a repairable issue
    #[serde(default = "default_required")]
    pub required: bool,

    /// Short description rendered into prompts
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    fn new(name: impl Into<String>, field_type: FieldType, vocabulary: Option<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            vocabulary,
            required: true,
            description: String::new(),
        }
    }

    /// A required free-text field
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text, None)
    }

    /// A required enum field bound to `vocabulary`
    pub fn enumerated(name: impl Into<String>, vocabulary: impl Into<String>) -> Self {
        Self::new(name, FieldType::Enum, Some(vocabulary.into()))
    }

    /// A required free list of strings
    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::List, None)
    }

    /// A required list of strings restricted to `vocabulary`
    pub fn list_of(name: impl Into<String>, vocabulary: impl Into<String>) -> Self {
        Self::new(name, FieldType::List, Some(vocabulary.into()))
    }

    /// A required number
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number, None)
    }

    /// A required count
    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Count, None)
    }

    /// Mark the field optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a prompt description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The closed, ordered set of fields
///
/// Field order is significant: prompts, consolidated records and tabular
/// output all follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Create a schema from its fields (validate with [`Schema::validate`])
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by exact name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is a schema field
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check the schema against the vocabularies it references
    pub fn validate(&self, vocabularies: &Vocabularies) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }

            match (&field.field_type, &field.vocabulary) {
                (FieldType::Enum, None) => {
                    return Err(SchemaError::MissingVocabulary(field.name.clone()));
                }
                (FieldType::Enum | FieldType::List, Some(name)) => {
                    let vocabulary = vocabularies.get(name).ok_or_else(|| {
                        SchemaError::UnknownVocabulary {
                            field: field.name.clone(),
                            vocabulary: name.clone(),
                        }
                    })?;
                    if vocabulary.is_empty() {
                        return Err(SchemaError::EmptyVocabulary(name.clone()));
                    }
                }
                (_, Some(_)) => {
                    return Err(SchemaError::VocabularyNotAllowed(field.name.clone()));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// The insurance / ESG risk profile schema
    pub fn risk_profile() -> Self {
        Self::new(vec![
            FieldSpec::text("entity_name")
                .describe("name of the insured party, company or organisation"),
            FieldSpec::enumerated("region", "regions"),
            FieldSpec::text("sector").describe("industry sector"),
            FieldSpec::enumerated("risk_type", "risk_types"),
            FieldSpec::enumerated("time_horizon", "time_horizons"),
            FieldSpec::list("key_risk_factors")
                .describe("short phrases naming the concrete risk drivers"),
            FieldSpec::text("risk_summary").describe("1 to 3 sentences"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_profile_is_valid() {
        let schema = Schema::risk_profile();
        assert_eq!(schema.len(), 7);
        assert!(schema.validate(&Vocabularies::risk_profile()).is_ok());
        assert_eq!(schema.names().next(), Some("entity_name"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = Schema::new(vec![FieldSpec::text("a"), FieldSpec::number("a")]);
        assert_eq!(
            schema.validate(&Vocabularies::new()),
            Err(SchemaError::DuplicateField("a".to_string()))
        );
    }

    #[test]
    fn test_missing_vocabulary_rejected() {
        let schema = Schema::new(vec![FieldSpec::enumerated("region", "regions")]);
        assert!(matches!(
            schema.validate(&Vocabularies::new()),
            Err(SchemaError::UnknownVocabulary { .. })
        ));
    }

    #[test]
    fn test_vocabulary_on_number_rejected() {
        let mut field = FieldSpec::number("limit");
        field.vocabulary = Some("regions".to_string());
        let schema = Schema::new(vec![field]);
        assert_eq!(
            schema.validate(&Vocabularies::risk_profile()),
            Err(SchemaError::VocabularyNotAllowed("limit".to_string()))
        );
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert_eq!(
            Schema::new(vec![]).validate(&Vocabularies::new()),
            Err(SchemaError::Empty)
        );
    }

    #[test]
    fn test_parse_toml_fields() {
        let schema: Schema = toml::from_str(
            r#"
            [[fields]]
            name = "region"
            type = "enum"
            vocabulary = "regions"

            [[fields]]
            name = "claims_filed"
            type = "count"
            required = false
            "#,
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        assert!(schema.fields()[0].required);
        assert_eq!(schema.fields()[1].field_type, FieldType::Count);
        assert!(!schema.fields()[1].required);
        assert!(schema.validate(&Vocabularies::risk_profile()).is_ok());
    }
}
