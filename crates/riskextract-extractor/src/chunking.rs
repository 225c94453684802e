//! Sliding-window chunking for documents

use crate::config::ChunkingConfig;
use crate::ExtractorError;
use riskextract_domain::{Chunk, Document};

/// Splits documents into overlapping character windows
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting `overlap >= window_size`
    pub fn new(config: ChunkingConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Lazily chunk a document
    ///
    /// The iterator is cheap to clone; each clone restarts from the same
    /// position.
    pub fn chunks<'a>(&self, document: &'a Document) -> Chunks<'a> {
        self.chunk_text(&document.id, &document.text)
    }

    /// Lazily chunk raw text on behalf of `document_id`
    pub fn chunk_text<'a>(&self, document_id: &'a str, text: &'a str) -> Chunks<'a> {
        Chunks {
            document_id,
            text,
            total_chars: text.chars().count(),
            window: self.config.window_size,
            step: self.config.step(),
            start_char: 0,
            start_byte: 0,
            sequence: 0,
            done: false,
        }
    }

    /// Number of chunks a text of `len` characters produces
    pub fn chunk_count(&self, len: usize) -> usize {
        remaining(len, 0, self.config.window_size, self.config.step())
    }
}

/// Iterator over the chunks of one text
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    document_id: &'a str,
    text: &'a str,
    total_chars: usize,
    window: usize,
    step: usize,
    start_char: usize,
    start_byte: usize,
    sequence: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done || self.start_char >= self.total_chars {
            return None;
        }

        let end_char = (self.start_char + self.window).min(self.total_chars);
        let rest = &self.text[self.start_byte..];
        let end_byte = self.start_byte + byte_offset(rest, end_char - self.start_char);

        let chunk = Chunk {
            document_id: self.document_id.to_string(),
            sequence: self.sequence,
            start: self.start_char,
            end: end_char,
            text: self.text[self.start_byte..end_byte].to_string(),
        };

        if end_char == self.total_chars {
            self.done = true;
        } else {
            self.start_byte += byte_offset(rest, self.step);
            self.start_char += self.step;
            self.sequence += 1;
        }

        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.done {
            0
        } else {
            remaining(self.total_chars, self.start_char, self.window, self.step)
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

fn remaining(total: usize, start: usize, window: usize, step: usize) -> usize {
    if start >= total {
        0
    } else if start + window >= total {
        1
    } else {
        1 + (total - start - window).div_ceil(step)
    }
}

/// Byte index of the `chars`-th character of `s` (or `s.len()`)
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}
