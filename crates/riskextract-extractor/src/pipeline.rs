//! Core Extractor implementation

use crate::chunking::Chunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::prompt::PromptBuilder;
use crate::report::RunMetrics;
use crate::retry::{generate_with_retry, Failure, RetryOutcome};
use crate::types::{CorpusExtraction, DocumentExtraction, DocumentFailure};
use futures::stream::{self, FuturesUnordered, StreamExt, TryStreamExt};
use riskextract_domain::{
    Chunk, ChunkExtractionRecord, Document, ExtractionClient, ExtractionContract,
    GenerationRequest, IssueKind, ValidationIssue, ValidationStatus,
};
use riskextract_gatekeeper::Gatekeeper;
use riskextract_synthesizer::Reducer;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The Extractor turns documents into consolidated records
///
/// One instance owns the shared contract, the generation client and the
/// request semaphore, so the concurrency bound holds across every document
/// it processes.
pub struct Extractor<C>
where
    C: ExtractionClient,
{
    client: Arc<C>,
    contract: Arc<ExtractionContract>,
    chunker: Chunker,
    prompts: PromptBuilder,
    gatekeeper: Gatekeeper,
    reducer: Reducer,
    config: ExtractorConfig,
    semaphore: Arc<Semaphore>,
}

impl<C> Extractor<C>
where
    C: ExtractionClient,
{
    /// Create a new Extractor
    ///
    /// Fails if the configuration is invalid or its reduction overrides do
    /// not fit the contract's schema.
    pub fn new(
        client: C,
        contract: Arc<ExtractionContract>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate()?;

        let chunker = Chunker::new(config.chunking)?;
        let prompts = PromptBuilder::from_shared(&contract);
        let gatekeeper = Gatekeeper::new(Arc::clone(&contract), config.validation.clone());
        let reducer = Reducer::new(Arc::clone(&contract), config.reducer.clone())?;
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Ok(Self {
            client: Arc::new(client),
            contract,
            chunker,
            prompts,
            gatekeeper,
            reducer,
            config,
            semaphore,
        })
    }

    /// Shared extraction contract
    pub fn contract(&self) -> &Arc<ExtractionContract> {
        &self.contract
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The chunker in use
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Fingerprint of the prompt template
    pub fn prompt_fingerprint(&self) -> &str {
        self.prompts.fingerprint()
    }

    /// Name of the generation client
    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Extract one chunk
    ///
    /// Never fails because of the client or its output: exhausted retries,
    /// permanent errors and malformed completions all become rejected
    /// records. Only cancellation or a closed semaphore surface as errors.
    pub async fn extract_chunk(
        &self,
        chunk: &Chunk,
        cancel: &CancellationToken,
    ) -> Result<ChunkExtractionRecord, ExtractorError> {
        let _permit = tokio::select! {
            permit = self.semaphore.acquire() => {
                permit.map_err(|e| ExtractorError::Task(e.to_string()))?
            }
            _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
        };

        let request = GenerationRequest::new(
            self.prompts.build(chunk),
            self.config.generation.model.as_str(),
            self.config.generation.temperature,
        );
        debug!(
            "Chunk {} [{}..{}): prompt length {} chars",
            chunk.id(),
            chunk.start,
            chunk.end,
            request.prompt.len()
        );

        let mut spent = 0;
        let mut reissued = 0;
        loop {
            let outcome =
                generate_with_retry(self.client.as_ref(), &request, &self.config.retry, cancel)
                    .await?;

            let record = match outcome {
                RetryOutcome::Completed { text, attempts } => {
                    spent += attempts;
                    self.gatekeeper
                        .validate(chunk.id(), &text)
                        .with_attempts(spent)
                }
                RetryOutcome::Failed(Failure::Permanent { attempts, message }) => {
                    spent += attempts;
                    ChunkExtractionRecord::rejected(
                        chunk.id(),
                        ValidationIssue::GenerationFailed(message),
                        spent,
                    )
                }
                RetryOutcome::Failed(Failure::Exhausted {
                    attempts,
                    last_error,
                }) => {
                    spent += attempts;
                    ChunkExtractionRecord::rejected(
                        chunk.id(),
                        ValidationIssue::ExhaustedRetries {
                            attempts,
                            last_error,
                        },
                        spent,
                    )
                }
            };

            if is_malformed(&record) && reissued < self.config.retry.malformed_retries {
                reissued += 1;
                debug!(
                    "Chunk {}: malformed output, re-issuing ({}/{})",
                    chunk.id(),
                    reissued,
                    self.config.retry.malformed_retries
                );
                continue;
            }

            match record.status {
                ValidationStatus::Rejected => warn!(
                    "Chunk {} rejected after {} attempt(s): {}",
                    chunk.id(),
                    record.attempts,
                    record
                        .issues
                        .first()
                        .map(|i| i.to_string())
                        .unwrap_or_default()
                ),
                status => debug!(
                    "Chunk {} {} with {} issue(s)",
                    chunk.id(),
                    status.as_str(),
                    record.issues.len()
                ),
            }
            return Ok(record);
        }
    }

    /// Extract and consolidate one document
    ///
    /// Chunks run concurrently, bounded by the shared semaphore. Records are
    /// re-sorted by chunk sequence before reduction, so completion order
    /// does not affect the result. A cancelled document is never reduced.
    pub async fn extract_document(
        &self,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<DocumentExtraction, ExtractorError> {
        if cancel.is_cancelled() {
            return Err(ExtractorError::Cancelled);
        }

        let chunks: Vec<Chunk> = self.chunker.chunks(document).collect();
        let total_chunks = chunks.len();
        info!(
            "Extracting document '{}' ({}, {} chars, {} chunks)",
            document.id,
            document.category,
            document.char_len(),
            total_chunks
        );

        let mut records: Vec<ChunkExtractionRecord> = chunks
            .iter()
            .map(|chunk| self.extract_chunk(chunk, cancel))
            .collect::<FuturesUnordered<_>>()
            .try_collect()
            .await?;

        if cancel.is_cancelled() {
            return Err(ExtractorError::Cancelled);
        }
        records.sort_by_key(|r| r.chunk.sequence);

        let record = self
            .reducer
            .reduce(&document.id, document.category, &records, total_chunks);

        if record.is_fully_unresolved() {
            warn!(
                "Document '{}' fully unresolved: no usable chunk out of {}",
                document.id, total_chunks
            );
        }
        info!(
            "Document '{}' complete: {}/{} chunks contributed, issues: {}",
            document.id,
            record.provenance.contributing_chunks,
            total_chunks,
            record.provenance.issues
        );

        Ok(DocumentExtraction {
            record,
            chunks: records,
        })
    }

    /// Extract a corpus
    ///
    /// Documents run concurrently up to `max_concurrent_documents`; results
    /// come back in input order. Cancelled documents are listed by id and
    /// carry no record.
    pub async fn extract_corpus(
        &self,
        documents: &[Document],
        cancel: &CancellationToken,
    ) -> CorpusExtraction {
        let started = Instant::now();
        info!(
            "Starting extraction of {} document(s) with {} (prompt {})",
            documents.len(),
            self.client.name(),
            &self.prompts.fingerprint()[..12]
        );

        let mut results: Vec<(usize, Result<DocumentExtraction, ExtractorError>)> =
            stream::iter(documents.iter().enumerate())
                .map(|(index, document)| async move {
                    (index, self.extract_document(document, cancel).await)
                })
                .buffer_unordered(self.config.max_concurrent_documents)
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);

        let mut corpus = CorpusExtraction::default();
        let mut metrics = RunMetrics::new();
        for (index, result) in results {
            let document_id = &documents[index].id;
            match result {
                Ok(extraction) => {
                    metrics.record_document(&extraction);
                    corpus.documents.push(extraction);
                }
                Err(ExtractorError::Cancelled) => {
                    metrics.record_cancelled();
                    corpus.cancelled.push(document_id.clone());
                }
                Err(e) => {
                    warn!("Document '{}' failed: {}", document_id, e);
                    metrics.record_failure();
                    corpus.failed.push(DocumentFailure {
                        document_id: document_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        metrics.elapsed = started.elapsed();

        info!(
            "Extraction complete: {} document(s), {} cancelled, {} failed, {} exhausted chunk(s)",
            metrics.total_documents(),
            metrics.cancelled,
            metrics.failed,
            metrics.exhausted_chunks()
        );
        corpus.metrics = metrics;
        corpus
    }
}

fn is_malformed(record: &ChunkExtractionRecord) -> bool {
    record.status == ValidationStatus::Rejected
        && record
            .issues
            .iter()
            .any(|i| i.kind() == IssueKind::MalformedOutput)
}
