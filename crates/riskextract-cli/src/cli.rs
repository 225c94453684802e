//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Riskextract - Extract consolidated risk records from documents.
#[derive(Debug, Parser)]
#[command(name = "riskextract")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.riskextract/config.toml)
    #[arg(short, long, global = true, env = "RISKEXTRACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (document ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract consolidated records from a directory of documents
    Extract(ExtractArgs),

    /// Show how a document is split into chunks
    Chunk(ChunkArgs),

    /// Print the prompt sent for one chunk of a document
    Prompt(PromptArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Directory of .txt documents
    pub input: PathBuf,

    /// Directory for records.json, records.csv and chunks.jsonl
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Also write every per-chunk record to chunks.jsonl
    #[arg(long)]
    pub emit_chunk_records: bool,

    /// Override the configured provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Override the configured model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Start from a settings preset instead of the configured pipeline settings
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Only process the first N documents
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the chunk command.
#[derive(Debug, Parser)]
pub struct ChunkArgs {
    /// Document to chunk
    pub file: PathBuf,

    /// Override the window size (characters)
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Override the overlap (characters)
    #[arg(long)]
    pub overlap: Option<usize>,
}

/// Arguments for the prompt command.
#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// Document to build the prompt from
    pub file: PathBuf,

    /// Chunk sequence number
    #[arg(long, default_value = "0")]
    pub chunk: usize,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check the configuration for errors
    Validate,
}

/// Provider argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProviderArg {
    /// Canned responses, no network
    Mock,
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible API
    Openai,
}

/// Preset argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Built-in defaults
    Default,
    /// Small windows, short timeouts, more parallelism
    Aggressive,
    /// Large windows, patient retries, permissive validation
    Lenient,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ProviderArg> for crate::config::ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Mock => crate::config::ProviderKind::Mock,
            ProviderArg::Ollama => crate::config::ProviderKind::Ollama,
            ProviderArg::Openai => crate::config::ProviderKind::Openai,
        }
    }
}

impl From<PresetArg> for riskextract_extractor::ExtractorConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => riskextract_extractor::ExtractorConfig::default(),
            PresetArg::Aggressive => riskextract_extractor::ExtractorConfig::aggressive(),
            PresetArg::Lenient => riskextract_extractor::ExtractorConfig::lenient(),
        }
    }
}
