//! Riskextract CLI library.
//!
//! This library provides the core functionality for the riskextract
//! command-line interface, including configuration management, document
//! discovery, command execution, and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
