//! Consolidation of per-chunk records

use crate::{FieldRule, NumberRule, ReducerConfig, ReducerError, TieBreak};
use indexmap::IndexMap;
use riskextract_domain::{
    normalize, ChunkExtractionRecord, ConsolidatedRecord, DocumentCategory, ExtractionContract,
    FieldProvenance, FieldValue, IssueSummary, Provenance, Resolution,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

struct Resolved {
    value: FieldValue,
    resolution: Resolution,
    conflicted: bool,
}

impl Resolved {
    fn unresolved() -> Self {
        Self {
            value: FieldValue::Unknown,
            resolution: Resolution::Unresolved,
            conflicted: false,
        }
    }
}

/// Reduces chunk records into one consolidated record per document
#[derive(Debug, Clone)]
pub struct Reducer {
    contract: Arc<ExtractionContract>,
    config: ReducerConfig,
}

impl Reducer {
    /// Create a reducer, checking the overrides against the schema
    pub fn new(contract: Arc<ExtractionContract>, config: ReducerConfig) -> Result<Self, ReducerError> {
        config.validate(contract.schema())?;
        Ok(Self { contract, config })
    }

    /// Active configuration
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Consolidate the records of one document
    ///
    /// Rejected records are excluded but their issues are counted. The
    /// remaining records are considered in chunk order, so the result does
    /// not depend on the order `records` arrived in. Total: with no usable
    /// record every field is `unknown` and the record is marked
    /// `fully_unresolved`.
    pub fn reduce(
        &self,
        document_id: &str,
        category: DocumentCategory,
        records: &[ChunkExtractionRecord],
        total_chunks: usize,
    ) -> ConsolidatedRecord {
        let mut usable: Vec<&ChunkExtractionRecord> =
            records.iter().filter(|r| r.is_usable()).collect();
        usable.sort_by_key(|r| r.chunk.sequence);

        let schema = self.contract.schema();
        let mut fields = IndexMap::with_capacity(schema.len());
        let mut field_provenance = IndexMap::with_capacity(schema.len());
        let mut conflicted_fields = Vec::new();
        let mut repaired_fields = Vec::new();

        for spec in schema.fields() {
            let name = spec.name.as_str();
            let values: Vec<&FieldValue> = usable
                .iter()
                .filter_map(|r| r.get(name))
                .filter(|v| !v.is_unknown())
                .collect();
            let distinct = count_distinct(&values);

            let resolved = if values.is_empty() {
                Resolved::unresolved()
            } else {
                self.apply(self.config.rule_for(name, spec.field_type), &values, distinct)
            };

            if resolved.conflicted {
                conflicted_fields.push(spec.name.clone());
            }
            let repaired = usable
                .iter()
                .any(|r| r.issues.iter().any(|i| i.repaired_field() == Some(name)));
            if repaired {
                repaired_fields.push(spec.name.clone());
            }

            field_provenance.insert(
                spec.name.clone(),
                FieldProvenance {
                    contributors: values.len(),
                    distinct_values: distinct,
                    resolution: resolved.resolution,
                },
            );
            fields.insert(spec.name.clone(), resolved.value);
        }

        debug!(
            "{}: reduced {} of {} chunk records ({} conflicted fields)",
            document_id,
            usable.len(),
            total_chunks,
            conflicted_fields.len()
        );

        ConsolidatedRecord {
            document_id: document_id.to_string(),
            category,
            fields,
            provenance: Provenance {
                contributing_chunks: usable.len(),
                total_chunks,
                fully_unresolved: usable.is_empty(),
                conflicted_fields,
                repaired_fields,
                fields: field_provenance,
                issues: IssueSummary::from_records(records),
            },
        }
    }

    fn apply(&self, rule: FieldRule, values: &[&FieldValue], distinct: usize) -> Resolved {
        match rule {
            FieldRule::Vote => vote(values, self.config.tie_break),
            FieldRule::Union => union(values),
            FieldRule::Max => aggregate(values, NumberRule::Max, distinct),
            FieldRule::Min => aggregate(values, NumberRule::Min, distinct),
            FieldRule::Mean => aggregate(values, NumberRule::Mean, distinct),
            FieldRule::Sum => aggregate(values, NumberRule::Sum, distinct),
            FieldRule::First => Resolved {
                value: values[0].clone(),
                resolution: Resolution::First,
                conflicted: distinct >= 2,
            },
            FieldRule::Concatenate { max_chars } => concatenate(values, max_chars),
        }
    }
}

fn value_key(value: &FieldValue) -> String {
    normalize(&value.to_cell())
}

fn count_distinct(values: &[&FieldValue]) -> usize {
    values.iter().map(|v| value_key(v)).collect::<HashSet<_>>().len()
}

fn vote(values: &[&FieldValue], tie_break: TieBreak) -> Resolved {
    struct Tally<'a> {
        key: String,
        representative: &'a FieldValue,
        count: usize,
    }

    // First-seen order
    let mut tallies: Vec<Tally> = Vec::new();
    for value in values {
        let key = value_key(value);
        match tallies.iter_mut().find(|t| t.key == key) {
            Some(tally) => tally.count += 1,
            None => tallies.push(Tally {
                key,
                representative: *value,
                count: 1,
            }),
        }
    }

    let top = tallies.iter().map(|t| t.count).max().unwrap_or(0);
    let leaders: Vec<&Tally> = tallies.iter().filter(|t| t.count == top).collect();
    let winner = match tie_break {
        TieBreak::Earliest => leaders.first(),
        TieBreak::Latest => leaders.last(),
    };

    let resolution = if tallies.len() == 1 {
        Resolution::Unanimous
    } else if leaders.len() == 1 {
        Resolution::Majority
    } else {
        Resolution::TieBreak
    };

    match winner {
        Some(tally) => Resolved {
            value: tally.representative.clone(),
            resolution,
            conflicted: tallies.len() >= 2,
        },
        None => Resolved::unresolved(),
    }
}

fn union(values: &[&FieldValue]) -> Resolved {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for value in values {
        let entries: &[String] = match value {
            FieldValue::List(items) => items,
            FieldValue::Text(text) => std::slice::from_ref(text),
            _ => &[],
        };
        for entry in entries {
            if seen.insert(normalize(entry)) {
                merged.push(entry.clone());
            }
        }
    }

    if merged.is_empty() {
        return Resolved::unresolved();
    }
    Resolved {
        value: FieldValue::List(merged),
        resolution: Resolution::Union,
        conflicted: false,
    }
}

fn aggregate(values: &[&FieldValue], rule: NumberRule, distinct: usize) -> Resolved {
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
    if numbers.is_empty() {
        return Resolved::unresolved();
    }

    let sum: f64 = numbers.iter().sum();
    let value = match rule {
        NumberRule::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        NumberRule::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        NumberRule::Mean => sum / numbers.len() as f64,
        NumberRule::Sum => sum,
    };

    Resolved {
        value: FieldValue::Number(value),
        resolution: Resolution::Aggregate,
        conflicted: matches!(rule, NumberRule::Max | NumberRule::Min) && distinct >= 2,
    }
}

fn concatenate(values: &[&FieldValue], max_chars: usize) -> Resolved {
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    for text in values.iter().filter_map(|v| v.as_text()) {
        if seen.insert(normalize(text)) {
            parts.push(text);
        }
    }

    if parts.is_empty() {
        return Resolved::unresolved();
    }
    Resolved {
        value: FieldValue::Text(truncate_chars(&parts.join(" "), max_chars)),
        resolution: Resolution::Concatenated,
        conflicted: false,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{} ...", cut.trim_end())
}
