//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// `path` is the explicit `--config` path, if any.
pub fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path = resolve(path)?;
            println!("{}", path.display());
        }
        ConfigAction::Init { force } => {
            let path = resolve(path)?;
            if path.exists() && !force {
                return Err(CliError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            Config::default().save_to(&path)?;
            println!(
                "{}",
                formatter.success(&format!("Wrote default configuration to {}", path.display()))
            );
        }
        ConfigAction::Validate => {
            config.validate()?;
            let contract = config.contract()?;
            println!("{}", formatter.success("Configuration is valid"));
            println!(
                "{}",
                formatter.info(&format!(
                    "Provider: {} ({}), {} schema field(s), {} vocabularies",
                    config.provider.kind.as_str(),
                    config.extractor.generation.model,
                    contract.schema().len(),
                    contract.vocabularies().len()
                ))
            );
        }
    }

    Ok(())
}

fn resolve(path: Option<&Path>) -> Result<std::path::PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::path(),
    }
}
