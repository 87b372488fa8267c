use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ragdoc_rag::openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
use ragdoc_rag::pinecone::PineconeVectorStore;
use ragdoc_rag::{
    AppConfig, DefaultExtractor, DocumentPayload, DocumentReport, DocumentStatus, IndexSpec,
    IngestReport, RagPipeline,
};
use tracing::{info, warn};

use crate::render;

/// Wire the OpenAI-compatible providers and the Pinecone store into a pipeline.
pub fn build_pipeline(config: &AppConfig) -> Result<RagPipeline> {
    let pipeline = RagPipeline::builder()
        .config(config.rag.clone())
        .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new(&config.embedding)?))
        .vector_store(Arc::new(PineconeVectorStore::new(&config.index)?))
        .completion_provider(Arc::new(OpenAICompletionProvider::new(&config.completion)?))
        .index_spec(IndexSpec::from_config(&config.index, config.embedding.dimensions))
        .generation((&config.completion).into())
        .build()
        .context("invalid pipeline configuration")?;
    Ok(pipeline)
}

pub async fn ingest(pipeline: &RagPipeline, paths: &[PathBuf]) -> Result<String> {
    let mut documents = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for (position, path) in paths.iter().enumerate() {
        match DocumentPayload::from_path(path) {
            Ok(document) => documents.push(document),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file, skipping");
                let entry = DocumentReport {
                    name: path.display().to_string(),
                    status: DocumentStatus::Skipped { reason: e.to_string() },
                };
                unreadable.push((position, entry));
            }
        }
    }
    info!(documents = documents.len(), unreadable = unreadable.len(), "ingesting documents");

    let mut report = pipeline.ingest_documents(&documents, Arc::new(DefaultExtractor)).await;
    merge_unreadable(&mut report, unreadable);
    Ok(render::ingest_report(&report))
}

/// Put files that could not be read back at their command-line positions.
fn merge_unreadable(report: &mut IngestReport, unreadable: Vec<(usize, DocumentReport)>) {
    for (position, entry) in unreadable {
        let position = position.min(report.documents.len());
        report.documents.insert(position, entry);
    }
}

pub async fn ask(pipeline: &RagPipeline, question: &str, show_context: bool) -> Result<String> {
    let outcome = pipeline.answer(question).await;
    Ok(render::query_outcome(&outcome, show_context))
}

pub async fn stats(pipeline: &RagPipeline) -> Result<String> {
    let stats = pipeline.stats().await.context("failed to read index statistics")?;
    let name = &pipeline.index_spec().name;
    Ok(match stats.dimension {
        Some(dimension) => {
            format!("Index '{name}': {} vectors, dimension {dimension}", stats.total_vector_count)
        }
        None => format!("Index '{name}': {} vectors", stats.total_vector_count),
    })
}
