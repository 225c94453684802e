//! Riskextract CLI - Command-line interface for the risk extraction pipeline.

use clap::Parser;
use riskextract_cli::cli::{ConfigAction, ConfigArgs};
use riskextract_cli::commands;
use riskextract_cli::{Cli, Command, Config, Formatter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> riskextract_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // `config init` must work before any file exists
    let config = match &cli.command {
        Command::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        }) => Config::default(),
        _ => Config::load(cli.config.as_deref())?,
    };

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    match cli.command {
        Command::Extract(args) => {
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown signal received, cancelling extraction");
                    trigger.cancel();
                }
            });

            let corpus = commands::execute_extract(args, &config, &formatter, cancel).await?;
            if !corpus.cancelled.is_empty() {
                std::process::exit(130);
            }
        }
        Command::Chunk(args) => {
            commands::execute_chunk(args, &config, &formatter)?;
        }
        Command::Prompt(args) => {
            commands::execute_prompt(args, &config)?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flags
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
