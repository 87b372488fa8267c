//! # ragdoc-rag
//!
//! Retrieval-augmented question answering over uploaded documents.
//!
//! ## Overview
//!
//! Documents are split into overlapping sentence-packed chunks, each chunk is
//! embedded and stored in a vector index under `{source}_chunk_{index}`, and
//! questions are answered by retrieving the most similar chunks and asking a
//! chat model to answer from that context alone.
//!
//! - [`chunking`]: sentence-packing [`SentenceChunker`] and [`chunk_text`]
//! - [`embedding`] / [`completion`]: provider traits for the model services
//! - [`vectorstore`]: the [`VectorStore`] trait with [`InMemoryVectorStore`]
//!   and, with the `pinecone` feature, a Pinecone REST backend
//! - [`prompt`]: the fixed two-message grounded [`Conversation`]
//! - [`pipeline`]: [`RagPipeline`], tying the pieces together
//!
//! ## Features
//!
//! - `openai` (default): OpenAI-compatible embedding and completion providers
//! - `pinecone` (default): Pinecone vector store
//! - `pdf` (default): PDF text extraction in [`DefaultExtractor`]
//! - `docx` (default): DOCX paragraph text in [`DefaultExtractor`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragdoc_rag::{AppConfig, IndexSpec, RagPipeline};
//! use ragdoc_rag::openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
//! use ragdoc_rag::pinecone::PineconeVectorStore;
//!
//! let config = AppConfig::from_env();
//! let pipeline = RagPipeline::builder()
//!     .config(config.rag.clone())
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new(&config.embedding)?))
//!     .vector_store(Arc::new(PineconeVectorStore::new(&config.index)?))
//!     .completion_provider(Arc::new(OpenAICompletionProvider::new(&config.completion)?))
//!     .index_spec(IndexSpec::from_config(&config.index, config.embedding.dimensions))
//!     .generation((&config.completion).into())
//!     .build()?;
//!
//! let outcome = pipeline.answer("What does the report conclude?").await;
//! ```

pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod inmemory;
pub mod pipeline;
pub mod prompt;
pub mod vectorstore;

#[cfg(any(feature = "openai", feature = "pinecone"))]
mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "pinecone")]
pub mod pinecone;

pub use chunking::{Chunker, SentenceChunker, chunk_text};
pub use completion::{CompletionProvider, GenerationParams};
pub use config::{AppConfig, CompletionConfig, EmbeddingConfig, IndexConfig, RagConfig};
pub use document::{Chunk, ChunkMetadata, IndexStats, IndexedRecord, QueryMatch, QueryResult};
pub use embedding::EmbeddingProvider;
pub use error::{FailureKind, RagError, Result};
pub use extraction::{DefaultExtractor, DocumentKind, DocumentPayload, TextExtractor};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{
    ChunkFailure, ChunkStage, DocumentOutcome, DocumentReport, DocumentStatus, IngestReport,
    QueryOutcome, RagPipeline, RagPipelineBuilder,
};
pub use prompt::{Conversation, Message, Role, build_conversation, join_context};
pub use vectorstore::{IndexHandle, IndexSpec, Metric, VectorStore};
