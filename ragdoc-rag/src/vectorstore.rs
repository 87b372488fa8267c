//! Vector store trait for persisting chunk embeddings and searching them.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::document::{IndexStats, IndexedRecord, QueryResult};
use crate::error::Result;

/// Similarity metric an index is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity.
    #[default]
    Cosine,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => f.write_str("cosine"),
        }
    }
}

/// What an index must look like when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Similarity metric.
    pub metric: Metric,
    /// Serverless cloud provider, for hosted backends.
    pub cloud: String,
    /// Serverless region, for hosted backends.
    pub region: String,
}

impl IndexSpec {
    /// A cosine index named `name` holding `dimension`-long vectors.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        let defaults = IndexConfig::default();
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
            cloud: defaults.cloud,
            region: defaults.region,
        }
    }

    /// An index spec built from configuration and the embedding dimension.
    pub fn from_config(config: &IndexConfig, dimension: usize) -> Self {
        Self {
            name: config.name.clone(),
            dimension,
            metric: Metric::Cosine,
            cloud: config.cloud.clone(),
            region: config.region.clone(),
        }
    }
}

/// A resolved reference to an existing index.
///
/// `dimension` is what the backend reports, which may differ from the
/// requested [`IndexSpec`] when the index already existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHandle {
    /// Index name.
    pub name: String,
    /// Data-plane address of the index.
    pub host: String,
    /// Vector dimension of the index.
    pub dimension: usize,
}

/// A storage backend for chunk embeddings with similarity search.
///
/// # Example
///
/// ```rust,ignore
/// use ragdoc_rag::{IndexSpec, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// let index = store.ensure_index(&IndexSpec::new("docs", 384)).await?;
/// store.upsert(&index, &records).await?;
/// let result = store.query(&index, &query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the index named in `spec`, creating it first if it does not exist.
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexHandle>;

    /// Insert records, overwriting any existing record with the same id.
    async fn upsert(&self, index: &IndexHandle, records: &[IndexedRecord]) -> Result<()>;

    /// Return at most `top_k` records most similar to `vector`, best first.
    async fn query(&self, index: &IndexHandle, vector: &[f32], top_k: usize)
    -> Result<QueryResult>;

    /// Report aggregate statistics for the index.
    async fn stats(&self, index: &IndexHandle) -> Result<IndexStats>;
}
