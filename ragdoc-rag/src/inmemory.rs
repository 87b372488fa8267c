//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and offline demos.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{IndexStats, IndexedRecord, QueryMatch, QueryResult};
use crate::error::{FailureKind, RagError, Result};
use crate::vectorstore::{IndexHandle, IndexSpec, VectorStore};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct MemoryIndex {
    dimension: usize,
    records: HashMap<String, IndexedRecord>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Indexes are stored as nested `HashMap`s: index name → record id → record.
/// Errors mirror what a hosted backend would answer: a missing index is a
/// `404` and a vector of the wrong length is a `400`.
///
/// # Example
///
/// ```rust,ignore
/// use ragdoc_rag::{IndexSpec, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// let index = store.ensure_index(&IndexSpec::new("docs", 384)).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn failure(status: u16, message: String) -> RagError {
        RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            kind: FailureKind::Status(status),
            message,
        }
    }

    fn not_found(name: &str) -> RagError {
        Self::failure(404, format!("index '{name}' does not exist"))
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexHandle> {
        let mut indexes = self.indexes.write().await;
        let index = indexes.entry(spec.name.clone()).or_insert_with(|| {
            debug!(backend = BACKEND, index = %spec.name, dimension = spec.dimension, "new index");
            MemoryIndex { dimension: spec.dimension, records: HashMap::new() }
        });
        Ok(IndexHandle {
            name: spec.name.clone(),
            host: format!("memory://{}", spec.name),
            dimension: index.dimension,
        })
    }

    async fn upsert(&self, index: &IndexHandle, records: &[IndexedRecord]) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        let store = indexes.get_mut(&index.name).ok_or_else(|| Self::not_found(&index.name))?;

        if let Some(bad) = records.iter().find(|r| r.values.len() != store.dimension) {
            return Err(Self::failure(
                400,
                format!(
                    "vector '{}' has dimension {} but index '{}' expects {}",
                    bad.id,
                    bad.values.len(),
                    index.name,
                    store.dimension
                ),
            ));
        }

        for record in records {
            store.records.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        index: &IndexHandle,
        vector: &[f32],
        top_k: usize,
    ) -> Result<QueryResult> {
        let indexes = self.indexes.read().await;
        let store = indexes.get(&index.name).ok_or_else(|| Self::not_found(&index.name))?;

        let scored = store
            .records
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(&record.values, vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        Ok(QueryResult::ranked(scored, top_k))
    }

    async fn stats(&self, index: &IndexHandle) -> Result<IndexStats> {
        let indexes = self.indexes.read().await;
        let store = indexes.get(&index.name).ok_or_else(|| Self::not_found(&index.name))?;
        Ok(IndexStats {
            total_vector_count: store.records.len() as u64,
            dimension: Some(store.dimension),
        })
    }
}
