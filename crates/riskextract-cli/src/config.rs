//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use riskextract_domain::{ExtractionContract, Schema, Vocabularies};
use riskextract_extractor::ExtractorConfig;
use riskextract_llm::openai::GROQ_ENDPOINT;
use riskextract_synthesizer::{FieldRule, ReducerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI configuration.
///
/// `schema` and `vocabularies` default to the built-in risk profile when
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Text generation backend
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Custom schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    /// Custom vocabularies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabularies: Option<Vocabularies>,
}

/// Which backend answers generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Canned responses, no network
    Mock,
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions API (Groq by default)
    Openai,
}

impl ProviderKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Openai => "openai",
        }
    }
}

/// Provider section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Backend kind
    pub kind: ProviderKind,

    /// Base URL; the backend default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Ask OpenAI-compatible backends for a JSON object response
    pub json_mode: bool,

    /// Reply used by the mock backend
    pub mock_response: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Openai,
            endpoint: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            json_mode: true,
            mock_response: "{}".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Endpoint for OpenAI-compatible backends
    pub fn openai_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(GROQ_ENDPOINT)
    }

    /// API key read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".riskextract").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Build the extraction contract
    pub fn contract(&self) -> Result<Arc<ExtractionContract>> {
        let contract = match (&self.schema, &self.vocabularies) {
            (None, None) => return Ok(ExtractionContract::risk_profile()),
            (Some(schema), vocabularies) => ExtractionContract::new(
                schema.clone(),
                vocabularies.clone().unwrap_or_default(),
            )?,
            (None, Some(vocabularies)) => {
                ExtractionContract::new(Schema::risk_profile(), vocabularies.clone())?
            }
        };
        Ok(Arc::new(contract))
    }

    /// Pipeline settings with the risk profile's reduction defaults filled in
    ///
    /// With the built-in schema, fields without an explicit override get
    /// the risk profile rules (`risk_summary` is concatenated).
    pub fn extractor_config(&self) -> ExtractorConfig {
        let mut config = self.extractor.clone();
        if self.schema.is_none() {
            for (field, rule) in ReducerConfig::risk_profile().field_overrides {
                config.reducer.field_overrides.entry(field).or_insert(rule);
            }
        }
        config
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        let contract = self.contract()?;
        let config = self.extractor_config();
        config.validate()?;
        config
            .reducer
            .validate(contract.schema())
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(())
    }

    /// Rule applied to `field`, for display
    pub fn rule_for(&self, field: &str) -> Result<FieldRule> {
        let contract = self.contract()?;
        let spec = contract
            .schema()
            .field(field)
            .ok_or_else(|| CliError::InvalidInput(format!("Unknown field '{}'", field)))?;
        Ok(self.extractor_config().reducer.rule_for(field, spec.field_type))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
