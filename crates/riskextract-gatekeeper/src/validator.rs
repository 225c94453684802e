//! Completion validation logic

use crate::{strip_envelope, ValidationConfig};
use indexmap::IndexMap;
use riskextract_domain::{
    normalize, ChunkExtractionRecord, ChunkId, ExtractionContract, FieldSpec, FieldType,
    FieldValue, ValidationIssue, ValidationStatus, UNKNOWN,
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// The Gatekeeper validates raw completions before reduction
///
/// Stateless apart from the shared contract, so one instance serves every
/// concurrent chunk worker.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    contract: Arc<ExtractionContract>,
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(contract: Arc<ExtractionContract>, config: ValidationConfig) -> Self {
        Self { contract, config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config(contract: Arc<ExtractionContract>) -> Self {
        Self::new(contract, ValidationConfig::default())
    }

    /// The contract completions are checked against
    pub fn contract(&self) -> &ExtractionContract {
        &self.contract
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one raw completion
    ///
    /// Never fails: malformed output becomes a `rejected` record. The
    /// returned record reports one attempt; callers that retried replace
    /// it with [`ChunkExtractionRecord::with_attempts`].
    pub fn validate(&self, chunk: ChunkId, raw: &str) -> ChunkExtractionRecord {
        let body = if self.config.accept_fenced_json {
            strip_envelope(raw)
        } else {
            raw.trim()
        };

        let parsed: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                debug!("{}: malformed output: {}", chunk, e);
                return ChunkExtractionRecord::rejected(
                    chunk,
                    ValidationIssue::MalformedOutput(e.to_string()),
                    1,
                );
            }
        };

        match parsed {
            Value::Object(object) => self.validate_object(chunk, &object),
            other => {
                let detail = format!("expected a JSON object, found {}", json_kind(&other));
                debug!("{}: malformed output: {}", chunk, detail);
                ChunkExtractionRecord::rejected(chunk, ValidationIssue::MalformedOutput(detail), 1)
            }
        }
    }

    fn validate_object(&self, chunk: ChunkId, object: &Map<String, Value>) -> ChunkExtractionRecord {
        let schema = self.contract.schema();
        let mut fields = IndexMap::with_capacity(schema.len());
        let mut issues = Vec::new();
        let mut passing = 0usize;
        let mut repaired = false;

        for spec in schema.fields() {
            let value = match object.get(&spec.name) {
                None => {
                    if spec.required {
                        issues.push(ValidationIssue::MissingField(spec.name.clone()));
                        repaired = true;
                    }
                    FieldValue::Unknown
                }
                Some(raw) => {
                    let before = issues.len();
                    let checked = self.check_field(spec, raw, &mut issues);
                    if issues.len() > before {
                        repaired = true;
                    }
                    match checked {
                        Some(value) => {
                            passing += 1;
                            value
                        }
                        None => FieldValue::Unknown,
                    }
                }
            };
            fields.insert(spec.name.clone(), value);
        }

        for key in object.keys() {
            if !schema.contains(key) {
                issues.push(ValidationIssue::UnexpectedField(key.clone()));
            }
        }

        if passing == 0 {
            debug!("{}: no usable fields", chunk);
            issues.push(ValidationIssue::NoUsableFields);
            return ChunkExtractionRecord {
                chunk,
                status: ValidationStatus::Rejected,
                fields: IndexMap::new(),
                issues,
                attempts: 1,
            };
        }

        let status = if repaired {
            ValidationStatus::Repaired
        } else {
            ValidationStatus::Accepted
        };
        debug!("{}: {} ({} issues)", chunk, status.as_str(), issues.len());

        ChunkExtractionRecord {
            chunk,
            status,
            fields,
            issues,
            attempts: 1,
        }
    }

    /// `Some` when the field passes (possibly as unknown); `None` after recording an issue
    fn check_field(
        &self,
        spec: &FieldSpec,
        raw: &Value,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<FieldValue> {
        if raw.is_null() {
            return Some(FieldValue::Unknown);
        }
        if let Value::String(s) = raw {
            if is_sentinel(s) {
                return Some(FieldValue::Unknown);
            }
        }

        match spec.field_type {
            FieldType::Text => match raw {
                Value::String(s) => Some(FieldValue::Text(s.trim().to_string())),
                other => invalid(spec, other, issues),
            },
            FieldType::Enum => match (raw, self.contract.vocabulary_for(spec)) {
                (Value::String(s), Some(vocabulary)) => match vocabulary.canonical(s) {
                    Some(canonical) => Some(FieldValue::Text(canonical.to_string())),
                    None => invalid(spec, raw, issues),
                },
                (Value::String(s), None) => Some(FieldValue::Text(s.trim().to_string())),
                (other, _) => invalid(spec, other, issues),
            },
            FieldType::List => match raw {
                Value::Array(items) => self.check_list(spec, items, issues),
                Value::String(_) if self.config.allow_scalar_lists => {
                    self.check_list(spec, std::slice::from_ref(raw), issues)
                }
                other => invalid(spec, other, issues),
            },
            FieldType::Number | FieldType::Count => self.check_number(spec, raw, issues),
        }
    }

    fn check_list(
        &self,
        spec: &FieldSpec,
        items: &[Value],
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<FieldValue> {
        let vocabulary = self.contract.vocabulary_for(spec);
        let mut kept = Vec::new();
        let mut seen = HashSet::new();
        let mut candidates = 0usize;

        for item in items {
            let entry = match item {
                Value::Null => continue,
                Value::String(s) if is_sentinel(s) => continue,
                Value::String(s) => s,
                other => {
                    candidates += 1;
                    issues.push(invalid_issue(spec, other));
                    continue;
                }
            };
            candidates += 1;

            let entry = match vocabulary {
                Some(vocabulary) => match vocabulary.canonical(entry) {
                    Some(canonical) => canonical.to_string(),
                    None => {
                        issues.push(invalid_issue(spec, item));
                        continue;
                    }
                },
                None => entry.trim().to_string(),
            };

            if seen.insert(normalize(&entry)) {
                kept.push(entry);
            }
        }

        if !kept.is_empty() {
            Some(FieldValue::List(kept))
        } else if candidates > 0 {
            None
        } else {
            Some(FieldValue::Unknown)
        }
    }

    fn check_number(
        &self,
        spec: &FieldSpec,
        raw: &Value,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<FieldValue> {
        let number = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if self.config.coerce_numeric_strings => parse_numeric(s),
            _ => None,
        };

        match number {
            Some(n) if n.is_finite() && fits_type(spec.field_type, n) => {
                Some(FieldValue::Number(n))
            }
            _ => invalid(spec, raw, issues),
        }
    }
}

fn fits_type(field_type: FieldType, n: f64) -> bool {
    match field_type {
        FieldType::Count => n >= 0.0 && n.fract() == 0.0,
        _ => true,
    }
}

fn is_sentinel(s: &str) -> bool {
    let normalized = normalize(s);
    normalized.is_empty() || normalized == UNKNOWN
}

fn parse_numeric(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned.trim().parse::<f64>().ok()
}

fn invalid_issue(spec: &FieldSpec, given: &Value) -> ValidationIssue {
    let given = match given {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ValidationIssue::InvalidValue {
        field: spec.name.clone(),
        given,
    }
}

fn invalid(
    spec: &FieldSpec,
    given: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<FieldValue> {
    issues.push(invalid_issue(spec, given));
    None
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use riskextract_domain::{Schema, Vocabularies};
    use serde_json::json;

    fn risk_gatekeeper() -> Gatekeeper {
        Gatekeeper::default_config(ExtractionContract::risk_profile())
    }

    fn claims_gatekeeper(config: ValidationConfig) -> Gatekeeper {
        let schema = Schema::new(vec![
            FieldSpec::text("entity_name"),
            FieldSpec::number("insured_value"),
            FieldSpec::count("incident_count"),
            FieldSpec::list_of("perils", "perils").optional(),
        ]);
        let vocabularies = Vocabularies::new().with("perils", ["flood", "fire", "theft"]);
        let contract = ExtractionContract::new(schema, vocabularies).unwrap();
        Gatekeeper::new(Arc::new(contract), config)
    }

    fn chunk() -> ChunkId {
        ChunkId::new("doc", 0)
    }

    fn full_risk_object() -> Value {
        json!({
            "entity_name": "Acme Re",
            "region": "Europe",
            "sector": "Reinsurance",
            "risk_type": "property",
            "time_horizon": "long_term",
            "key_risk_factors": ["flood", "wildfire"],
            "risk_summary": "Exposure to European floods."
        })
    }

    #[test]
    fn test_complete_object_is_accepted() {
        let record = risk_gatekeeper().validate(chunk(), &full_risk_object().to_string());

        assert_eq!(record.status, ValidationStatus::Accepted);
        assert!(record.issues.is_empty());
        assert_eq!(record.fields.len(), 7);
        assert_eq!(record.get("region"), Some(&FieldValue::Text("europe".to_string())));
        assert_eq!(
            record.get("key_risk_factors"),
            Some(&FieldValue::List(vec!["flood".into(), "wildfire".into()]))
        );
    }

    #[test]
    fn test_out_of_vocabulary_enum_is_repaired() {
        let mut object = full_risk_object();
        object["region"] = json!("Atlantis");

        let record = risk_gatekeeper().validate(chunk(), &object.to_string());

        assert_eq!(record.status, ValidationStatus::Repaired);
        assert_eq!(record.get("region"), Some(&FieldValue::Unknown));
        assert_eq!(
            record.issues,
            vec![ValidationIssue::InvalidValue {
                field: "region".to_string(),
                given: "Atlantis".to_string(),
            }]
        );
    }

    #[test]
    fn test_enum_lookup_is_normalized() {
        let mut object = full_risk_object();
        object["region"] = json!("  NORTH_AMERICA ");

        let record = risk_gatekeeper().validate(chunk(), &object.to_string());
        assert_eq!(record.status, ValidationStatus::Accepted);
        assert_eq!(record.get("region").unwrap().as_text(), Some("north_america"));
    }

    #[test]
    fn test_missing_required_field_is_repaired() {
        let mut object = full_risk_object();
        object.as_object_mut().unwrap().remove("sector");

        let record = risk_gatekeeper().validate(chunk(), &object.to_string());

        assert_eq!(record.status, ValidationStatus::Repaired);
        assert_eq!(record.get("sector"), Some(&FieldValue::Unknown));
        assert_eq!(record.issues, vec![ValidationIssue::MissingField("sector".to_string())]);
    }

    #[test]
    fn test_missing_optional_field_is_silent() {
        let gatekeeper = claims_gatekeeper(ValidationConfig::default());
        let raw = r#"{"entity_name": "Acme", "insured_value": 10, "incident_count": 2}"#;

        let record = gatekeeper.validate(chunk(), raw);
        assert_eq!(record.status, ValidationStatus::Accepted);
        assert_eq!(record.get("perils"), Some(&FieldValue::Unknown));
    }

    #[test]
    fn test_sentinel_values_pass() {
        let raw = r#"{"entity_name": "unknown", "region": " Unknown ", "sector": null}"#;
        let record = risk_gatekeeper().validate(chunk(), raw);

        assert_ne!(record.status, ValidationStatus::Rejected);
        assert!(record.fields.values().all(FieldValue::is_unknown));
        assert!(record
            .issues
            .iter()
            .all(|i| matches!(i, ValidationIssue::MissingField(_))));
    }

    #[test]
    fn test_non_json_is_rejected() {
        let record = risk_gatekeeper().validate(chunk(), "I could not find any risks.");
        assert_eq!(record.status, ValidationStatus::Rejected);
        assert!(record.fields.is_empty());
        assert!(matches!(record.issues[0], ValidationIssue::MalformedOutput(_)));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let record = risk_gatekeeper().validate(chunk(), "[1, 2, 3]");
        assert_eq!(record.status, ValidationStatus::Rejected);
        match &record.issues[0] {
            ValidationIssue::MalformedOutput(detail) => assert!(detail.contains("an array")),
            other => panic!("unexpected issue {:?}", other),
        }
    }

    #[test]
    fn test_fenced_output_is_accepted_by_default_only() {
        let raw = format!("```json\n{}\n```", full_risk_object());

        let lenient = risk_gatekeeper().validate(chunk(), &raw);
        assert_eq!(lenient.status, ValidationStatus::Accepted);

        let strict = Gatekeeper::new(ExtractionContract::risk_profile(), ValidationConfig::strict())
            .validate(chunk(), &raw);
        assert_eq!(strict.status, ValidationStatus::Rejected);
    }

    #[test]
    fn test_empty_object_has_no_usable_fields() {
        let record = risk_gatekeeper().validate(chunk(), "{}");
        assert_eq!(record.status, ValidationStatus::Rejected);
        assert_eq!(record.issues.last(), Some(&ValidationIssue::NoUsableFields));
    }

    #[test]
    fn test_unexpected_field_is_dropped_without_status_change() {
        let mut object = full_risk_object();
        object["confidence"] = json!(0.9);

        let record = risk_gatekeeper().validate(chunk(), &object.to_string());
        assert_eq!(record.status, ValidationStatus::Accepted);
        assert!(record.get("confidence").is_none());
        assert_eq!(
            record.issues,
            vec![ValidationIssue::UnexpectedField("confidence".to_string())]
        );
    }

    #[test]
    fn test_wrong_type_is_invalid() {
        let mut object = full_risk_object();
        object["sector"] = json!(42);
        object["key_risk_factors"] = json!("flood");

        let record = risk_gatekeeper().validate(chunk(), &object.to_string());
        assert_eq!(record.status, ValidationStatus::Repaired);
        assert_eq!(record.get("sector"), Some(&FieldValue::Unknown));
        assert_eq!(record.get("key_risk_factors"), Some(&FieldValue::Unknown));
        assert_eq!(record.issues.len(), 2);
    }

    #[test]
    fn test_scalar_list_allowed_when_permissive() {
        let gatekeeper = claims_gatekeeper(ValidationConfig::permissive());
        let raw = r#"{"entity_name": "Acme", "insured_value": 1, "incident_count": 0, "perils": "Fire"}"#;

        let record = gatekeeper.validate(chunk(), raw);
        assert_eq!(record.status, ValidationStatus::Accepted);
        assert_eq!(record.get("perils"), Some(&FieldValue::List(vec!["fire".into()])));
    }

    #[test]
    fn test_vocabulary_list_drops_non_members() {
        let gatekeeper = claims_gatekeeper(ValidationConfig::default());
        let raw = r#"{"entity_name": "Acme", "perils": ["Flood", "meteor", "", "flood", "theft"]}"#;

        let record = gatekeeper.validate(chunk(), raw);
        assert_eq!(record.status, ValidationStatus::Repaired);
        assert_eq!(
            record.get("perils"),
            Some(&FieldValue::List(vec!["flood".into(), "theft".into()]))
        );
        assert!(record.issues.contains(&ValidationIssue::InvalidValue {
            field: "perils".to_string(),
            given: "meteor".to_string(),
        }));
    }

    #[test]
    fn test_list_with_no_surviving_entries_is_unknown() {
        let gatekeeper = claims_gatekeeper(ValidationConfig::default());

        let all_invalid = gatekeeper.validate(chunk(), r#"{"entity_name": "Acme", "perils": ["meteor"]}"#);
        assert_eq!(all_invalid.get("perils"), Some(&FieldValue::Unknown));
        assert_eq!(all_invalid.status, ValidationStatus::Repaired);

        let empty = gatekeeper.validate(chunk(), r#"{"perils": []}"#);
        assert_eq!(empty.status, ValidationStatus::Repaired);
        assert_eq!(empty.get("perils"), Some(&FieldValue::Unknown));
    }

    #[test]
    fn test_numeric_coercion() {
        let raw = r#"{"entity_name": "Acme", "insured_value": "1,250,000", "incident_count": "3"}"#;

        let lenient = claims_gatekeeper(ValidationConfig::default()).validate(chunk(), raw);
        assert_eq!(lenient.status, ValidationStatus::Accepted);
        assert_eq!(lenient.get("insured_value"), Some(&FieldValue::Number(1_250_000.0)));
        assert_eq!(lenient.get("incident_count"), Some(&FieldValue::Number(3.0)));

        let strict = claims_gatekeeper(ValidationConfig::strict()).validate(chunk(), raw);
        assert_eq!(strict.status, ValidationStatus::Repaired);
        assert_eq!(strict.get("insured_value"), Some(&FieldValue::Unknown));
    }

    #[test]
    fn test_count_must_be_non_negative_integer() {
        let gatekeeper = claims_gatekeeper(ValidationConfig::default());

        for bad in ["-1", "2.5"] {
            let raw = format!(r#"{{"entity_name": "Acme", "insured_value": 1, "incident_count": {}}}"#, bad);
            let record = gatekeeper.validate(chunk(), &raw);
            assert_eq!(record.get("incident_count"), Some(&FieldValue::Unknown), "{}", bad);
            assert_eq!(record.status, ValidationStatus::Repaired);
        }
    }

    proptest! {
        #[test]
        fn prop_prose_is_always_rejected(text in "[a-zA-Z][a-zA-Z ,.]{0,60}") {
            let record = risk_gatekeeper().validate(chunk(), &text);
            prop_assert_eq!(record.status, ValidationStatus::Rejected);
        }

        #[test]
        fn prop_one_valid_field_is_never_rejected(
            name in "[A-Za-z][A-Za-z ]{0,30}",
            junk in proptest::option::of("[a-z]{1,10}"),
        ) {
            let mut object = json!({ "entity_name": name, "region": "Atlantis", "sector": 7 });
            if let Some(key) = junk {
                object[format!("x_{}", key)] = json!("noise");
            }
            let record = risk_gatekeeper().validate(chunk(), &object.to_string());
            prop_assert_ne!(record.status, ValidationStatus::Rejected);
        }
    }
}
