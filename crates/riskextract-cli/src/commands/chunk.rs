//! Chunk command implementation.

use crate::cli::ChunkArgs;
use crate::config::Config;
use crate::error::Result;
use crate::loader::load_document;
use crate::output::Formatter;
use riskextract_domain::Chunk;
use riskextract_extractor::Chunker;

/// Execute the chunk command.
pub fn execute_chunk(args: ChunkArgs, config: &Config, formatter: &Formatter) -> Result<Vec<Chunk>> {
    let mut chunking = config.extractor.chunking;
    if let Some(window) = args.window {
        chunking.window_size = window;
    }
    if let Some(overlap) = args.overlap {
        chunking.overlap = overlap;
    }
    let chunker = Chunker::new(chunking)?;

    let document = load_document(&args.file)?;
    let chunks: Vec<Chunk> = chunker.chunks(&document).collect();

    println!("{}", formatter.format_chunks(&chunks)?);
    eprintln!(
        "{}",
        formatter.info(&format!(
            "{}: {} chars, {} chunk(s) (window {}, overlap {})",
            document.id,
            document.char_len(),
            chunks.len(),
            chunking.window_size,
            chunking.overlap
        ))
    );
    Ok(chunks)
}
