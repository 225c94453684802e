//! Field values, including the "unknown" sentinel

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The sentinel text used for any field that could not be determined
pub const UNKNOWN: &str = "unknown";

/// A schema-typed field value
///
/// `Unknown` is the single sentinel for every field type. It serializes as
/// the JSON string `"unknown"` so the data contract stays explicit in both
/// nested and tabular output.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Not determinable from the source
    #[default]
    Unknown,
    /// Free text or a canonical vocabulary value
    Text(String),
    /// List of strings
    List(Vec<String>),
    /// Number or count
    Number(f64),
}

impl FieldValue {
    /// Whether this is the sentinel
    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldValue::Unknown)
    }

    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List content, if this is a list value
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric content, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render for a flat, one-cell-per-field table
    ///
    /// Lists are joined with `"; "`; integral numbers drop the fraction.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Unknown => UNKNOWN.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join("; "),
            FieldValue::Number(n) => format_number(*n),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cell())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Unknown => serializer.serialize_str(UNKNOWN),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Null(()),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Null(()) => FieldValue::Unknown,
            RawValue::Text(s) if s == UNKNOWN => FieldValue::Unknown,
            RawValue::Text(s) => FieldValue::Text(s),
            RawValue::List(items) => FieldValue::List(items),
            RawValue::Number(n) => FieldValue::Number(n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_serializes_as_sentinel() {
        let json = serde_json::to_string(&FieldValue::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }

    #[test]
    fn test_deserialize_shapes() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"["unknown", "europe", ["fire", "flood"], 2.5, null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Unknown,
                FieldValue::Text("europe".to_string()),
                FieldValue::List(vec!["fire".to_string(), "flood".to_string()]),
                FieldValue::Number(2.5),
                FieldValue::Unknown,
            ]
        );
    }

    #[test]
    fn test_cells() {
        assert_eq!(FieldValue::Unknown.to_cell(), "unknown");
        assert_eq!(
            FieldValue::List(vec!["a".into(), "b".into()]).to_cell(),
            "a; b"
        );
        assert_eq!(FieldValue::Number(3.0).to_cell(), "3");
        assert_eq!(FieldValue::Number(2.5).to_cell(), "2.5");
    }
}
