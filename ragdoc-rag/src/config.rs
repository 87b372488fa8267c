//! Configuration for the RAG pipeline and the services it calls.
//!
//! All settings are collected once into an [`AppConfig`] (usually via
//! [`AppConfig::from_env`]) and passed by value into each gateway constructor.
//! Component logic never reads the environment itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RagError, Result};

/// Environment variable holding the embedding/completion provider credential.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the vector index credential.
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";

/// Configuration parameters for chunking, retrieval, and ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Maximum number of chunks embedded and stored concurrently during ingestion.
    pub ingest_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200, top_k: 3, ingest_concurrency: 1 }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `ingest_concurrency == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.ingest_concurrency == 0 {
            return Err(RagError::ConfigError(
                "ingest_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set how many chunks may be embedded and stored at the same time.
    pub fn ingest_concurrency(mut self, n: usize) -> Self {
        self.config.ingest_concurrency = n;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Settings for the embedding service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Bearer token; `None` makes every call fail with missing credentials.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Dimension of the vectors the model returns.
    pub dimensions: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionConfig {
    /// Bearer token; `None` makes every call fail with missing credentials.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: "gpt-4.1-nano".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl CompletionConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the vector index service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// API key; `None` makes every call fail with missing credentials.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Index name.
    pub name: String,
    /// Serverless cloud provider.
    pub cloud: String,
    /// Serverless region.
    pub region: String,
    /// Control-plane URL used to list and create indexes.
    pub control_plane_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            name: "rag-docs".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            timeout_secs: 30,
        }
    }
}

impl IndexConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Every setting the application needs, gathered in one place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Chunking and retrieval tunables.
    pub rag: RagConfig,
    /// Embedding service settings.
    pub embedding: EmbeddingConfig,
    /// Completion service settings.
    pub completion: CompletionConfig,
    /// Vector index settings.
    pub index: IndexConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// Missing credentials are not an error here; see
    /// [`missing_credentials`](Self::missing_credentials).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Values that fail to parse are ignored with a warning and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_key = get(OPENAI_API_KEY_VAR);
        config.embedding.api_key = openai_key.clone();
        config.completion.api_key = openai_key;
        config.index.api_key = get(PINECONE_API_KEY_VAR);

        if let Some(url) = get("OPENAI_BASE_URL") {
            let url = url.trim_end_matches('/').to_string();
            config.embedding.base_url = url.clone();
            config.completion.base_url = url;
        }
        if let Some(model) = get("RAG_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(model) = get("RAG_LLM_MODEL") {
            config.completion.model = model;
        }
        if let Some(name) = get("RAG_INDEX_NAME") {
            config.index.name = name;
        }
        if let Some(cloud) = get("PINECONE_CLOUD") {
            config.index.cloud = cloud;
        }
        if let Some(region) = get("PINECONE_REGION") {
            config.index.region = region;
        }

        parse_into(&get, "RAG_CHUNK_SIZE", &mut config.rag.chunk_size);
        parse_into(&get, "RAG_CHUNK_OVERLAP", &mut config.rag.chunk_overlap);
        parse_into(&get, "RAG_TOP_K", &mut config.rag.top_k);
        parse_into(&get, "RAG_INGEST_CONCURRENCY", &mut config.rag.ingest_concurrency);
        parse_into(&get, "RAG_EMBEDDING_DIMENSION", &mut config.embedding.dimensions);
        parse_into(&get, "RAG_MAX_TOKENS", &mut config.completion.max_tokens);
        parse_into(&get, "RAG_TEMPERATURE", &mut config.completion.temperature);

        config
    }

    /// Names of the credential variables that were not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.embedding.api_key.is_none() {
            missing.push(OPENAI_API_KEY_VAR);
        }
        if self.index.api_key.is_none() {
            missing.push(PINECONE_API_KEY_VAR);
        }
        missing
    }
}

fn parse_into<T, G>(get: &G, key: &str, target: &mut T)
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        match raw.parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "ignoring unparseable configuration value"),
        }
    }
}
