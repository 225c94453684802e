//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::{Config, ProviderKind};
use crate::error::{CliError, Result};
use crate::loader::load_documents;
use crate::output::{write_outputs, Formatter};
use riskextract_domain::{Document, ExtractionClient, ExtractionContract};
use riskextract_extractor::{CorpusExtraction, Extractor, ExtractorConfig};
use riskextract_llm::{ollama, MockProvider, OllamaProvider, OpenAiCompatProvider};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Execute the extract command.
///
/// Writes whatever completed before cancellation; cancelled documents are
/// reported but produce no record.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
    cancel: CancellationToken,
) -> Result<CorpusExtraction> {
    let mut config = config.clone();
    if let Some(preset) = args.preset {
        config.extractor = preset.into();
    }
    if let Some(model) = args.model {
        config.extractor.generation.model = model;
    }
    if let Some(provider) = args.provider {
        config.provider.kind = provider.into();
    }
    config.validate()?;

    let contract = config.contract()?;
    let pipeline = config.extractor_config();

    let mut loaded = load_documents(&args.input)?;
    if let Some(limit) = args.limit {
        loaded.documents.truncate(limit);
    }
    if !loaded.skipped.is_empty() {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "Skipped {} file(s) with no recognizable category",
                loaded.skipped.len()
            ))
        );
    }
    if loaded.documents.is_empty() {
        eprintln!(
            "{}",
            formatter.warning(&format!("No documents found in {}", args.input.display()))
        );
    }

    let documents = loaded.documents;
    let provider = &config.provider;
    let corpus = match provider.kind {
        ProviderKind::Mock => {
            let client = MockProvider::new(provider.mock_response.clone());
            run(client, contract.clone(), pipeline, &documents, &cancel).await?
        }
        ProviderKind::Ollama => {
            let endpoint = provider
                .endpoint
                .clone()
                .unwrap_or_else(|| ollama::DEFAULT_ENDPOINT.to_string());
            let client = OllamaProvider::new(endpoint, pipeline.generation.model.clone());
            run(client, contract.clone(), pipeline, &documents, &cancel).await?
        }
        ProviderKind::Openai => {
            let api_key = provider.api_key().ok_or_else(|| {
                CliError::Config(format!(
                    "API key not set: export {} or choose another provider",
                    provider.api_key_env
                ))
            })?;
            let client = OpenAiCompatProvider::new(
                provider.openai_endpoint(),
                pipeline.generation.model.clone(),
            )
            .with_api_key(api_key)
            .with_json_mode(provider.json_mode);
            run(client, contract.clone(), pipeline, &documents, &cancel).await?
        }
    };

    let written = write_outputs(
        &args.output,
        contract.schema(),
        &corpus,
        args.emit_chunk_records,
    )?;

    let records: Vec<_> = corpus.records().collect();
    println!("{}", formatter.format_records(&records)?);
    for path in &written {
        eprintln!("{}", formatter.success(&format!("Wrote {}", path.display())));
    }
    if !corpus.cancelled.is_empty() {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "Cancelled: {} document(s) not processed",
                corpus.cancelled.len()
            ))
        );
    }
    for failure in &corpus.failed {
        eprintln!(
            "{}",
            formatter.error(&format!("{}: {}", failure.document_id, failure.error))
        );
    }
    tracing::info!("Run finished. Final metrics:\n{}", corpus.metrics.summary());

    Ok(corpus)
}

async fn run<C>(
    client: C,
    contract: Arc<ExtractionContract>,
    pipeline: ExtractorConfig,
    documents: &[Document],
    cancel: &CancellationToken,
) -> Result<CorpusExtraction>
where
    C: ExtractionClient,
{
    let extractor = Extractor::new(client, contract, pipeline)?;
    tracing::debug!(
        "Using {} with model {} (prompt fingerprint {})",
        extractor.client_name(),
        extractor.config().generation.model,
        extractor.prompt_fingerprint()
    );
    Ok(extractor.extract_corpus(documents, cancel).await)
}
