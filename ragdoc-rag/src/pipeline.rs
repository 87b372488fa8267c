//! Ingestion and question-answering orchestrator.
//!
//! The [`RagPipeline`] composes an [`EmbeddingProvider`], a [`VectorStore`],
//! a [`CompletionProvider`], and a [`Chunker`] into the two user-facing flows:
//!
//! - ingestion: extract → chunk → embed → upsert, one record per chunk
//! - answering: embed question → search → build prompt → complete
//!
//! Neither flow raises on provider failures. Ingestion reports per-document
//! and per-chunk outcomes; answering resolves to a [`QueryOutcome`] with a
//! human-readable status.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragdoc_rag::{InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .completion_provider(Arc::new(my_llm))
//!     .build()?;
//!
//! pipeline.ingest_text("notes.txt", "Rust is fast. Rust is safe.").await?;
//! let outcome = pipeline.answer("Is Rust safe?").await;
//! println!("{}", outcome.status());
//! ```

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, SentenceChunker};
use crate::completion::{CompletionProvider, GenerationParams};
use crate::config::{IndexConfig, RagConfig};
use crate::document::{Chunk, IndexStats, IndexedRecord, QueryResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extraction::{DocumentPayload, TextExtractor};
use crate::prompt::{build_conversation, join_context};
use crate::vectorstore::{IndexHandle, IndexSpec, VectorStore};

/// Step of the per-chunk ingestion at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    /// Computing the chunk's embedding.
    Embedding,
    /// Writing the record to the index.
    Upsert,
}

impl fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedding => f.write_str("embedding"),
            Self::Upsert => f.write_str("upsert"),
        }
    }
}

/// A chunk that was not stored.
#[derive(Debug)]
pub struct ChunkFailure {
    /// Position of the chunk within its source.
    pub index: usize,
    /// Record id the chunk would have been stored under.
    pub id: String,
    /// Where the chunk failed.
    pub stage: ChunkStage,
    /// The underlying error.
    pub error: RagError,
}

impl ChunkFailure {
    fn new(chunk: &Chunk, stage: ChunkStage, error: RagError) -> Self {
        Self { index: chunk.index, id: chunk.id(), stage, error }
    }
}

/// Result of ingesting the text of one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Source name the chunks were stored under.
    pub source: String,
    /// Number of chunks the text was split into.
    pub chunk_count: usize,
    /// Number of chunks successfully upserted.
    pub stored: usize,
    /// Chunks that were not stored, in chunk order.
    pub failures: Vec<ChunkFailure>,
}

impl DocumentOutcome {
    fn empty(source: &str) -> Self {
        Self { source: source.to_string(), chunk_count: 0, stored: 0, failures: Vec::new() }
    }

    /// Whether every chunk was stored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What happened to one document of an ingestion batch.
#[derive(Debug)]
pub enum DocumentStatus {
    /// Text was extracted and chunked; some or all chunks may have been stored.
    Ingested(DocumentOutcome),
    /// The document was not ingested: unsupported type, unreadable, or empty.
    Skipped {
        /// Why the document was skipped.
        reason: String,
    },
    /// The index could not be prepared for this document.
    Failed {
        /// The underlying error.
        error: RagError,
    },
}

/// Per-document entry of an [`IngestReport`].
#[derive(Debug)]
pub struct DocumentReport {
    /// Document name.
    pub name: String,
    /// What happened to it.
    pub status: DocumentStatus,
}

/// Outcome of ingesting a batch of documents, in input order.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// One entry per input document.
    pub documents: Vec<DocumentReport>,
}

impl IngestReport {
    fn ingested(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.documents.iter().filter_map(|d| match &d.status {
            DocumentStatus::Ingested(outcome) => Some(outcome),
            _ => None,
        })
    }

    /// Total number of chunks stored across all documents.
    pub fn total_stored(&self) -> usize {
        self.ingested().map(|o| o.stored).sum()
    }

    /// Number of documents whose text was ingested.
    pub fn processed(&self) -> usize {
        self.ingested().count()
    }

    /// Number of documents that were skipped.
    pub fn skipped(&self) -> usize {
        self.documents.iter().filter(|d| matches!(d.status, DocumentStatus::Skipped { .. })).count()
    }

    /// Number of documents that failed.
    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|d| matches!(d.status, DocumentStatus::Failed { .. })).count()
    }

    /// One-line summary over every submitted document, e.g.
    /// `Processed 12 chunks from 3 documents`.
    pub fn summary(&self) -> String {
        format!(
            "Processed {} chunks from {} documents",
            self.total_stored(),
            self.documents.len()
        )
    }
}

/// How a question was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The search returned nothing, or the question could not be embedded.
    NoRelevantDocuments,
    /// The index could not be searched.
    SearchFailed {
        /// Description of the failure.
        message: String,
    },
    /// Context was found but the completion call failed.
    GenerationFailed {
        /// The retrieved context.
        matches: QueryResult,
        /// Description of the failure.
        message: String,
    },
    /// A grounded answer was generated.
    Answered {
        /// The generated answer.
        answer: String,
        /// The context it was grounded on.
        matches: QueryResult,
    },
}

impl QueryOutcome {
    /// Human-readable status line for this outcome.
    pub fn status(&self) -> &'static str {
        match self {
            Self::NoRelevantDocuments => "No relevant documents found",
            Self::SearchFailed { .. } => "Failed to search documents",
            Self::GenerationFailed { .. } => "Failed to generate answer",
            Self::Answered { .. } => "Answer generated",
        }
    }

    /// The generated answer, if any.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { answer, .. } => Some(answer),
            _ => None,
        }
    }

    /// The retrieved context, if the search produced any.
    pub fn matches(&self) -> Option<&QueryResult> {
        match self {
            Self::GenerationFailed { matches, .. } | Self::Answered { matches, .. } => {
                Some(matches)
            }
            _ => None,
        }
    }
}

/// The ingestion and question-answering pipeline.
///
/// Construct one via [`RagPipeline::builder()`]. The index is resolved
/// lazily on first use and reused for the lifetime of the pipeline.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    completion_provider: Arc<dyn CompletionProvider>,
    chunker: Arc<dyn Chunker>,
    index_spec: IndexSpec,
    generation: GenerationParams,
    index: OnceCell<IndexHandle>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return the spec the index is created with.
    pub fn index_spec(&self) -> &IndexSpec {
        &self.index_spec
    }

    /// Resolve the index, creating it on first use.
    ///
    /// # Errors
    ///
    /// Fails if the vector store cannot be reached, or with
    /// [`RagError::ConfigError`] if an existing index has a different
    /// dimension than the embedding provider.
    pub async fn index(&self) -> Result<&IndexHandle> {
        self.index
            .get_or_try_init(|| async {
                let handle = self.vector_store.ensure_index(&self.index_spec).await.map_err(|e| {
                    error!(index = %self.index_spec.name, error = %e, "failed to prepare index");
                    e
                })?;
                let expected = self.embedding_provider.dimensions();
                if handle.dimension != expected {
                    error!(
                        index = %handle.name,
                        index_dimension = handle.dimension,
                        embedding_dimension = expected,
                        "index dimension mismatch"
                    );
                    return Err(RagError::ConfigError(format!(
                        "index '{}' has dimension {} but embeddings have dimension {expected}",
                        handle.name, handle.dimension
                    )));
                }
                info!(index = %handle.name, dimension = handle.dimension, "index ready");
                Ok::<_, RagError>(handle)
            })
            .await
    }

    async fn store_chunk(
        &self,
        index: &IndexHandle,
        chunk: &Chunk,
    ) -> std::result::Result<(), ChunkFailure> {
        let values = self
            .embedding_provider
            .embed(&chunk.text)
            .await
            .map_err(|e| ChunkFailure::new(chunk, ChunkStage::Embedding, e))?;

        if values.len() != index.dimension {
            let error = RagError::PipelineError(format!(
                "embedding has dimension {} but index '{}' expects {}",
                values.len(),
                index.name,
                index.dimension
            ));
            return Err(ChunkFailure::new(chunk, ChunkStage::Embedding, error));
        }

        let record = IndexedRecord::from_chunk(chunk, values);
        self.vector_store
            .upsert(index, std::slice::from_ref(&record))
            .await
            .map_err(|e| ChunkFailure::new(chunk, ChunkStage::Upsert, e))
    }

    /// Chunk `text`, then embed and upsert each chunk under `source`.
    ///
    /// Chunks are processed with up to `ingest_concurrency` in flight. A chunk
    /// that fails to embed or store is recorded in the outcome and never
    /// written; its siblings carry on.
    ///
    /// # Errors
    ///
    /// Fails only if the index cannot be prepared.
    pub async fn ingest_text(&self, source: &str, text: &str) -> Result<DocumentOutcome> {
        let chunks = self.chunker.chunk(source, text);
        if chunks.is_empty() {
            info!(source, chunk_count = 0, "ingested document (empty)");
            return Ok(DocumentOutcome::empty(source));
        }

        let index = self.index().await?;
        let results: Vec<_> = stream::iter(&chunks)
            .map(|chunk| self.store_chunk(index, chunk))
            .buffered(self.config.ingest_concurrency)
            .collect()
            .await;

        let mut outcome = DocumentOutcome::empty(source);
        outcome.chunk_count = chunks.len();
        for result in results {
            match result {
                Ok(()) => outcome.stored += 1,
                Err(failure) => {
                    warn!(
                        source,
                        chunk = failure.index,
                        stage = %failure.stage,
                        error = %failure.error,
                        "chunk not stored"
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        info!(
            source,
            chunk_count = outcome.chunk_count,
            stored = outcome.stored,
            failed = outcome.failures.len(),
            "ingested document"
        );
        Ok(outcome)
    }

    /// Ingest a batch of documents, one after another.
    ///
    /// Never aborts the batch: unsupported, unreadable, and empty documents
    /// are skipped, and a document whose index cannot be prepared is marked
    /// failed. Extraction runs on the blocking pool, so an extractor that
    /// panics on a malformed file only skips that file.
    pub async fn ingest_documents(
        &self,
        documents: &[DocumentPayload],
        extractor: Arc<dyn TextExtractor>,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        for document in documents {
            let status = self.ingest_document(document, &extractor).await;
            report.documents.push(DocumentReport { name: document.name.clone(), status });
        }
        info!(
            processed = report.processed(),
            skipped = report.skipped(),
            failed = report.failed(),
            stored = report.total_stored(),
            "ingestion finished"
        );
        report
    }

    async fn ingest_document(
        &self,
        document: &DocumentPayload,
        extractor: &Arc<dyn TextExtractor>,
    ) -> DocumentStatus {
        let text = match extract_off_runtime(document, extractor).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    document = %document.name,
                    kind = %document.kind,
                    error = %e,
                    "skipping document"
                );
                return DocumentStatus::Skipped { reason: e.to_string() };
            }
        };
        if text.trim().is_empty() {
            warn!(document = %document.name, "no text extracted, skipping document");
            return DocumentStatus::Skipped { reason: "no text could be extracted".to_string() };
        }
        debug!(document = %document.name, text_len = text.len(), "extracted text");

        match self.ingest_text(&document.name, &text).await {
            Ok(outcome) => DocumentStatus::Ingested(outcome),
            Err(error) => DocumentStatus::Failed { error },
        }
    }

    /// Find the `top_k` stored chunks most similar to `question`.
    ///
    /// If the question cannot be embedded the search is skipped and an empty
    /// result is returned.
    ///
    /// # Errors
    ///
    /// Fails if the index cannot be prepared or searched.
    pub async fn retrieve(&self, question: &str) -> Result<QueryResult> {
        let vector = match self.embedding_provider.embed(question).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "query embedding failed, skipping search");
                return Ok(QueryResult::empty());
            }
        };

        let index = self.index().await?;
        if vector.len() != index.dimension {
            warn!(
                embedding_dimension = vector.len(),
                index_dimension = index.dimension,
                "query embedding has wrong dimension, skipping search"
            );
            return Ok(QueryResult::empty());
        }

        let result = self.vector_store.query(index, &vector, self.config.top_k).await.map_err(|e| {
            error!(index = %index.name, error = %e, "vector store search failed");
            e
        })?;

        info!(match_count = result.len(), "query completed");
        Ok(result)
    }

    /// Answer `question` from the indexed documents.
    pub async fn answer(&self, question: &str) -> QueryOutcome {
        let matches = match self.retrieve(question).await {
            Ok(matches) => matches,
            Err(e) => return QueryOutcome::SearchFailed { message: e.to_string() },
        };
        if matches.is_empty() {
            return QueryOutcome::NoRelevantDocuments;
        }

        let conversation = build_conversation(&join_context(&matches), question);
        match self.completion_provider.complete(&conversation, &self.generation).await {
            Ok(answer) => {
                info!(answer_len = answer.len(), context = matches.len(), "answered question");
                QueryOutcome::Answered { answer, matches }
            }
            Err(e) => {
                error!(error = %e, "answer generation failed");
                QueryOutcome::GenerationFailed { matches, message: e.to_string() }
            }
        }
    }

    /// Report statistics for the index.
    pub async fn stats(&self) -> Result<IndexStats> {
        let index = self.index().await?;
        self.vector_store.stats(index).await
    }
}

async fn extract_off_runtime(
    document: &DocumentPayload,
    extractor: &Arc<dyn TextExtractor>,
) -> Result<String> {
    let payload = document.clone();
    let extractor = Arc::clone(extractor);
    tokio::task::spawn_blocking(move || extractor.extract(&payload)).await.map_err(|e| {
        RagError::ExtractionError {
            name: document.name.clone(),
            message: format!("extraction aborted: {e}"),
        }
    })?
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider`, `vector_store`, and `completion_provider`
/// are required. The chunker defaults to a [`SentenceChunker`] sized from
/// the config, the index spec to the default index name with the embedding
/// provider's dimension, and generation parameters to their defaults.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    index_spec: Option<IndexSpec>,
    generation: Option<GenerationParams>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the completion provider.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Override the chunker derived from the config.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the spec the index is created with.
    pub fn index_spec(mut self, spec: IndexSpec) -> Self {
        self.index_spec = Some(spec);
        self
    }

    /// Set the generation parameters used for answers.
    pub fn generation(mut self, params: GenerationParams) -> Self {
        self.generation = Some(params);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, the
    /// config is invalid, or the index spec's dimension differs from the
    /// embedding provider's.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let completion_provider = self
            .completion_provider
            .ok_or_else(|| RagError::ConfigError("completion_provider is required".to_string()))?;

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(SentenceChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let dimension = embedding_provider.dimensions();
        let index_spec = self
            .index_spec
            .unwrap_or_else(|| IndexSpec::from_config(&IndexConfig::default(), dimension));
        if index_spec.dimension != dimension {
            return Err(RagError::ConfigError(format!(
                "index spec dimension {} does not match embedding dimension {dimension}",
                index_spec.dimension
            )));
        }

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            completion_provider,
            chunker,
            index_spec,
            generation: self.generation.unwrap_or_default(),
            index: OnceCell::new(),
        })
    }
}
