//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::loader::load_document;
use riskextract_extractor::{Chunker, PromptBuilder};

/// Execute the prompt command, returning the rendered prompt.
pub fn execute_prompt(args: PromptArgs, config: &Config) -> Result<String> {
    let contract = config.contract()?;
    let chunker = Chunker::new(config.extractor.chunking)?;
    let builder = PromptBuilder::from_shared(&contract);

    let document = load_document(&args.file)?;
    let total = chunker.chunk_count(document.char_len());
    let chunk = chunker.chunks(&document).nth(args.chunk).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "{} has {} chunk(s); no chunk {}",
            document.id, total, args.chunk
        ))
    })?;

    tracing::debug!("Prompt fingerprint {}", builder.fingerprint());
    let prompt = builder.build(&chunk);
    print!("{}", prompt);
    Ok(prompt)
}
