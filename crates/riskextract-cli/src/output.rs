//! Output formatting and artifact writers for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use riskextract_domain::{Chunk, ConsolidatedRecord, Schema};
use riskextract_extractor::{CorpusExtraction, DocumentExtraction};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Nested records file name
pub const RECORDS_JSON: &str = "records.json";

/// Flat records file name
pub const RECORDS_CSV: &str = "records.csv";

/// Per-chunk records file name
pub const CHUNKS_JSONL: &str = "chunks.jsonl";

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format consolidated records.
    pub fn format_records(&self, records: &[&ConsolidatedRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => Ok(self.format_records_table(records)),
            OutputFormat::Quiet => Ok(records
                .iter()
                .map(|r| r.document_id.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_records_table(&self, records: &[&ConsolidatedRecord]) -> String {
        if records.is_empty() {
            return self.colorize("No records produced.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Document", "Category", "Chunks", "Conflicted", "Repaired", "Issues", "Status"]);

        for record in records {
            let provenance = &record.provenance;
            let status = if provenance.fully_unresolved {
                "unresolved"
            } else {
                "ok"
            };
            builder.push_record([
                record.document_id.clone(),
                record.category.to_string(),
                format!("{}/{}", provenance.contributing_chunks, provenance.total_chunks),
                provenance.conflicted_fields.len().to_string(),
                provenance.repaired_fields.len().to_string(),
                provenance.issues.total().to_string(),
                status.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format the chunks of one document.
    pub fn format_chunks(&self, chunks: &[Chunk]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(chunks)?),
            OutputFormat::Quiet => Ok(chunks
                .iter()
                .map(|c| format!("{}\t{}", c.start, c.end))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if chunks.is_empty() {
                    return Ok(self.colorize("Document is empty.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Chunk", "Start", "End", "Chars", "Preview"]);
                for chunk in chunks {
                    builder.push_record([
                        chunk.sequence.to_string(),
                        chunk.start.to_string(),
                        chunk.end.to_string(),
                        chunk.len().to_string(),
                        preview(&chunk.text, 40),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Single-line excerpt of at most `max_chars` characters
fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let flat = flat.trim();
    if flat.chars().count() <= max_chars {
        flat.to_string()
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

/// Write the run artifacts into `dir`, returning the paths written
pub fn write_outputs(
    dir: &Path,
    schema: &Schema,
    corpus: &CorpusExtraction,
    emit_chunk_records: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let records: Vec<&ConsolidatedRecord> = corpus.records().collect();

    let json_path = dir.join(RECORDS_JSON);
    write_records_json(&json_path, &records)?;

    let csv_path = dir.join(RECORDS_CSV);
    write_records_csv(&csv_path, schema, &records)?;

    let mut written = vec![json_path, csv_path];
    if emit_chunk_records {
        let chunks_path = dir.join(CHUNKS_JSONL);
        write_chunk_records(&chunks_path, &corpus.documents)?;
        written.push(chunks_path);
    }
    Ok(written)
}

/// Nested records with fields, provenance and issue summary
pub fn write_records_json(path: &Path, records: &[&ConsolidatedRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// One row per document, one column per schema field in schema order
pub fn write_records_csv(path: &Path, schema: &Schema, records: &[&ConsolidatedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = vec!["document_id", "category"];
    header.extend(schema.names());
    header.extend([
        "contributing_chunks",
        "total_chunks",
        "fully_unresolved",
        "repaired_fields",
        "conflicted_fields",
        "issue_count",
    ]);
    writer.write_record(&header)?;

    for record in records {
        let provenance = &record.provenance;
        let mut row = vec![record.document_id.clone(), record.category.to_string()];
        row.extend(schema.names().map(|name| {
            record
                .get(name)
                .map(|value| value.to_cell())
                .unwrap_or_else(|| riskextract_domain::UNKNOWN.to_string())
        }));
        row.extend([
            provenance.contributing_chunks.to_string(),
            provenance.total_chunks.to_string(),
            provenance.fully_unresolved.to_string(),
            provenance.repaired_fields.join("; "),
            provenance.conflicted_fields.join("; "),
            provenance.issues.total().to_string(),
        ]);
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Every per-chunk record as JSON lines, document then chunk order
pub fn write_chunk_records(path: &Path, documents: &[DocumentExtraction]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for document in documents {
        for record in &document.chunks {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}
