//! Reducer configuration

use crate::ReducerError;
use riskextract_domain::{FieldType, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which candidate wins a tied vote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The value that appeared first, in chunk order
    #[default]
    Earliest,
    /// The value whose first appearance is latest
    Latest,
}

/// How numeric fields are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberRule {
    /// Largest value
    Max,
    /// Smallest value
    Min,
    /// Arithmetic mean
    Mean,
    /// Total
    Sum,
}

impl NumberRule {
    /// The equivalent field rule
    pub fn as_field_rule(self) -> FieldRule {
        match self {
            NumberRule::Max => FieldRule::Max,
            NumberRule::Min => FieldRule::Min,
            NumberRule::Mean => FieldRule::Mean,
            NumberRule::Sum => FieldRule::Sum,
        }
    }
}

/// Explicit reduction rule for one field
///
/// In TOML:
///
/// ```toml
/// [field_overrides.risk_summary]
/// rule = "concatenate"
/// max_chars = 800
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Majority vote over normalized values
    Vote,
    /// Order-preserving union of list entries
    Union,
    /// Largest number
    Max,
    /// Smallest number
    Min,
    /// Mean of numbers
    Mean,
    /// Sum of numbers
    Sum,
    /// Value from the earliest contributing chunk
    First,
    /// Distinct texts joined in chunk order, truncated with `" ..."`
    Concatenate {
        /// Character limit before the truncation marker
        max_chars: usize,
    },
}

impl FieldRule {
    /// Rule name as written in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRule::Vote => "vote",
            FieldRule::Union => "union",
            FieldRule::Max => "max",
            FieldRule::Min => "min",
            FieldRule::Mean => "mean",
            FieldRule::Sum => "sum",
            FieldRule::First => "first",
            FieldRule::Concatenate { .. } => "concatenate",
        }
    }

    /// Whether the rule can reduce values of `field_type`
    pub fn accepts(&self, field_type: FieldType) -> bool {
        match self {
            FieldRule::Vote | FieldRule::Concatenate { .. } => {
                matches!(field_type, FieldType::Text | FieldType::Enum)
            }
            FieldRule::Union => field_type == FieldType::List,
            FieldRule::Max | FieldRule::Min | FieldRule::Mean | FieldRule::Sum => {
                field_type.is_numeric()
            }
            FieldRule::First => true,
        }
    }
}

/// Configuration for consolidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Tie-break for votes
    pub tie_break: TieBreak,

    /// Aggregation for `number` fields
    pub number_rule: NumberRule,

    /// Aggregation for `count` fields
    pub count_rule: NumberRule,

    /// Per-field rules taking precedence over the type defaults
    pub field_overrides: BTreeMap<String, FieldRule>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::Earliest,
            number_rule: NumberRule::Max,
            count_rule: NumberRule::Sum,
            field_overrides: BTreeMap::new(),
        }
    }
}

impl ReducerConfig {
    /// Defaults plus an 800-character concatenated `risk_summary`
    pub fn risk_profile() -> Self {
        Self::default().with_override("risk_summary", FieldRule::Concatenate { max_chars: 800 })
    }

    /// Builder-style override
    pub fn with_override(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.field_overrides.insert(field.into(), rule);
        self
    }

    /// The rule applied to a field of the given type
    pub fn rule_for(&self, field: &str, field_type: FieldType) -> FieldRule {
        if let Some(rule) = self.field_overrides.get(field) {
            return *rule;
        }
        match field_type {
            FieldType::Text | FieldType::Enum => FieldRule::Vote,
            FieldType::List => FieldRule::Union,
            FieldType::Number => self.number_rule.as_field_rule(),
            FieldType::Count => self.count_rule.as_field_rule(),
        }
    }

    /// Check every override against the schema
    pub fn validate(&self, schema: &Schema) -> Result<(), ReducerError> {
        for (name, rule) in &self.field_overrides {
            let field = schema
                .field(name)
                .ok_or_else(|| ReducerError::UnknownField(name.clone()))?;

            if !rule.accepts(field.field_type) {
                return Err(ReducerError::IncompatibleRule {
                    field: name.clone(),
                    rule: rule.as_str().to_string(),
                    field_type: field.field_type.as_str().to_string(),
                });
            }

            if let FieldRule::Concatenate { max_chars: 0 } = rule {
                return Err(ReducerError::InvalidLimit(name.clone()));
            }
        }
        Ok(())
    }
}
