//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Strip a surrounding markdown code fence before parsing
    pub accept_fenced_json: bool,

    /// Accept numbers written as strings ("1,200") for number and count fields
    pub coerce_numeric_strings: bool,

    /// Accept a bare string for a list field as a one-entry list
    pub allow_scalar_lists: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            accept_fenced_json: true,
            coerce_numeric_strings: true,
            allow_scalar_lists: false,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (every leniency enabled)
    pub fn permissive() -> Self {
        Self {
            accept_fenced_json: true,
            coerce_numeric_strings: true,
            allow_scalar_lists: true,
        }
    }

    /// Create a strict configuration (output must be a bare, exactly-typed object)
    pub fn strict() -> Self {
        Self {
            accept_fenced_json: false,
            coerce_numeric_strings: false,
            allow_scalar_lists: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert!(config.accept_fenced_json);
        assert!(config.coerce_numeric_strings);
        assert!(!config.allow_scalar_lists);
    }

    #[test]
    fn test_permissive_config() {
        assert!(ValidationConfig::permissive().allow_scalar_lists);
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert!(!config.accept_fenced_json);
        assert!(!config.coerce_numeric_strings);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ValidationConfig = toml::from_str("allow_scalar_lists = true").unwrap();
        assert!(config.allow_scalar_lists);
        assert!(config.accept_fenced_json);
    }
}
