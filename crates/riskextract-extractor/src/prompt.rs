//! LLM prompt engineering for risk extraction

use riskextract_domain::{Chunk, ExtractionContract, FieldSpec, FieldType, UNKNOWN};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::sync::Arc;

/// Builds extraction prompts from the contract
///
/// Everything except the chunk text is rendered once, at construction, so
/// prompts are byte-identical for identical input.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    preamble: String,
    fingerprint: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(contract: &ExtractionContract) -> Self {
        let preamble = render_preamble(contract);
        let fingerprint = format!("{:x}", Sha256::digest(preamble.as_bytes()));
        Self {
            preamble,
            fingerprint,
        }
    }

    /// Create a prompt builder from a shared contract
    pub fn from_shared(contract: &Arc<ExtractionContract>) -> Self {
        Self::new(contract.as_ref())
    }

    /// Build the complete extraction prompt for one chunk
    pub fn build(&self, chunk: &Chunk) -> String {
        let text = chunk.text.trim();
        let mut prompt = String::with_capacity(self.preamble.len() + text.len() + 1);
        prompt.push_str(&self.preamble);
        prompt.push_str(text);
        prompt.push('\n');
        prompt
    }

    /// Hex SHA-256 of the prompt template without chunk text
    ///
    /// Changes whenever the schema, vocabularies or instructions change.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn render_preamble(contract: &ExtractionContract) -> String {
    let mut out = String::new();
    out.push_str(EXTRACTION_INSTRUCTIONS);
    out.push_str("\n\nOutput format:\nReturn a single JSON object with exactly these fields:\n");

    for field in contract.schema().fields() {
        let _ = writeln!(out, "- {}", describe_field(contract, field));
    }

    out.push('\n');
    out.push_str(&CONSTRAINTS.replace("{unknown}", UNKNOWN));
    out.push_str("\n\nDocument chunk:\n");
    out
}

fn describe_field(contract: &ExtractionContract, field: &FieldSpec) -> String {
    let allowed = contract
        .vocabulary_for(field)
        .map(|v| v.values().join(", "));

    let kind = match (field.field_type, allowed) {
        (FieldType::Text, _) => "string".to_string(),
        (FieldType::Enum, Some(values)) => format!("string, one of: {}", values),
        (FieldType::Enum, None) => "string".to_string(),
        (FieldType::List, Some(values)) => format!("list of strings, each one of: {}", values),
        (FieldType::List, None) => "list of strings".to_string(),
        (FieldType::Number, _) => "number".to_string(),
        (FieldType::Count, _) => "non-negative integer".to_string(),
    };
    let presence = if field.required { "required" } else { "optional" };

    if field.description.is_empty() {
        format!("{} ({}; {})", field.name, kind, presence)
    } else {
        format!("{} ({}; {}): {}", field.name, kind, presence, field.description)
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are an AI assistant that extracts structured risk information from insurance related text.

Your task:
- Read the provided document chunk carefully.
- Extract the requested fields based only on information in this chunk."#;

const CONSTRAINTS: &str = r#"Constraints:
- Use only the fields listed above. Do not add extra fields.
- Use only the allowed values for fields that list them.
- Do not invent entities, locations, or risks that are not supported by the text.
- If a field is not mentioned or cannot be determined from this chunk, use the string "{unknown}".
- Respond with a single valid JSON object only. No commentary, no markdown, no code fences."#;
