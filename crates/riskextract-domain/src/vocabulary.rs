//! Controlled vocabularies - closed sets of permissible field values

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Normalize a value for vocabulary membership and deduplication
///
/// Trims, case-folds and collapses runs of internal whitespace to a single
/// space, so `"  North   America "` and `"north america"` compare equal.
///
/// # Examples
///
/// ```
/// use riskextract_domain::normalize;
///
/// assert_eq!(normalize("  Asia   Pacific "), "asia pacific");
/// assert_eq!(normalize("CYBER"), "cyber");
/// ```
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A named, ordered set of allowed string values
///
/// Values keep their declared spelling and order (prompts list them in
/// that order). Lookups are normalized and return the canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlledVocabulary {
    name: String,
    values: Vec<String>,
    index: HashMap<String, usize>,
}

impl ControlledVocabulary {
    /// Create a vocabulary from its declared values
    ///
    /// Values that normalize to the same key are kept once (first wins).
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept = Vec::new();
        let mut index = HashMap::new();
        for value in values {
            let value: String = value.into();
            let key = normalize(&value);
            if key.is_empty() || index.contains_key(&key) {
                continue;
            }
            index.insert(key, kept.len());
            kept.push(value.trim().to_string());
        }

        Self {
            name: name.into(),
            values: kept,
            index,
        }
    }

    /// Vocabulary name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared values, in declaration order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vocabulary has no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up the canonical spelling of a value, if it is a member
    pub fn canonical(&self, value: &str) -> Option<&str> {
        self.index
            .get(&normalize(value))
            .map(|&i| self.values[i].as_str())
    }

    /// Membership test after normalization
    pub fn contains(&self, value: &str) -> bool {
        self.canonical(value).is_some()
    }
}

/// The full set of vocabularies, keyed by name
///
/// Serialized as a plain table of `name = [values...]`, which is how it
/// appears in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct Vocabularies {
    sets: BTreeMap<String, ControlledVocabulary>,
}

impl Vocabularies {
    /// Create an empty vocabulary set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a vocabulary
    pub fn insert(&mut self, vocabulary: ControlledVocabulary) {
        self.sets.insert(vocabulary.name.clone(), vocabulary);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(ControlledVocabulary::new(name, values));
        self
    }

    /// Get a vocabulary by name
    pub fn get(&self, name: &str) -> Option<&ControlledVocabulary> {
        self.sets.get(name)
    }

    /// Iterate vocabularies in name order
    pub fn iter(&self) -> impl Iterator<Item = &ControlledVocabulary> {
        self.sets.values()
    }

    /// Number of vocabularies
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no vocabularies are defined
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Vocabularies of the insurance / ESG risk profile
    pub fn risk_profile() -> Self {
        Self::new()
            .with(
                "risk_types",
                [
                    "property",
                    "marine",
                    "motor",
                    "cyber",
                    "liability",
                    "health",
                    "travel",
                    "esg",
                    "operational",
                    "other",
                ],
            )
            .with(
                "regions",
                [
                    "global",
                    "europe",
                    "north_america",
                    "asia_pacific",
                    "latin_america",
                    "middle_east_africa",
                ],
            )
            .with(
                "time_horizons",
                [
                    "short_term",
                    "medium_term",
                    "long_term",
                    "multi_horizon",
                    "not_specified",
                ],
            )
    }
}

impl From<BTreeMap<String, Vec<String>>> for Vocabularies {
    fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
        let mut vocabularies = Self::new();
        for (name, values) in raw {
            vocabularies.insert(ControlledVocabulary::new(name, values));
        }
        vocabularies
    }
}

impl From<Vocabularies> for BTreeMap<String, Vec<String>> {
    fn from(vocabularies: Vocabularies) -> Self {
        vocabularies
            .sets
            .into_iter()
            .map(|(name, vocabulary)| (name, vocabulary.values))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_lookup_is_normalized() {
        let regions = ControlledVocabulary::new("regions", ["north_america", "europe"]);
        assert_eq!(regions.canonical("  EUROPE "), Some("europe"));
        assert_eq!(regions.canonical("North_America"), Some("north_america"));
        assert_eq!(regions.canonical("Atlantis"), None);
    }

    #[test]
    fn test_duplicate_values_collapse() {
        let vocab = ControlledVocabulary::new("v", ["Fire", "fire", " FIRE ", "flood"]);
        assert_eq!(vocab.values(), &["Fire".to_string(), "flood".to_string()]);
        assert_eq!(vocab.canonical("fire"), Some("Fire"));
    }

    #[test]
    fn test_internal_whitespace_collapses() {
        let vocab = ControlledVocabulary::new("sectors", ["real estate"]);
        assert!(vocab.contains("Real    Estate"));
        assert!(!vocab.contains("realestate"));
    }

    #[test]
    fn test_risk_profile_vocabularies() {
        let vocabularies = Vocabularies::risk_profile();
        assert_eq!(vocabularies.len(), 3);
        assert_eq!(vocabularies.get("risk_types").map(|v| v.len()), Some(10));
        assert_eq!(vocabularies.get("regions").map(|v| v.len()), Some(6));
        assert!(vocabularies.get("time_horizons").unwrap().contains("not_specified"));
    }

    #[test]
    fn test_toml_table_form() {
        let parsed: Vocabularies = toml::from_str(
            r#"
            regions = ["europe", "global"]
            perils = ["flood", "fire"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("perils").unwrap().name(), "perils");
        assert_eq!(parsed.get("perils").unwrap().values()[0], "flood");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "[A-Za-z0-9 _\\t-]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_declared_values_are_members(values in proptest::collection::vec("[a-z_]{1,12}", 1..8)) {
            let vocab = ControlledVocabulary::new("v", values.clone());
            for value in &values {
                prop_assert!(vocab.contains(&value.to_uppercase()));
            }
        }
    }
}
