//! Pinecone vector store backend.
//!
//! Provides [`PineconeVectorStore`] which implements [`VectorStore`] against
//! the Pinecone REST API: the control plane to describe and create serverless
//! indexes, and each index's own host for upserts, queries, and statistics.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdoc_rag::config::IndexConfig;
//! use ragdoc_rag::pinecone::PineconeVectorStore;
//! use ragdoc_rag::vectorstore::{IndexSpec, VectorStore};
//!
//! let config = IndexConfig::default();
//! let store = PineconeVectorStore::new(&config)?;
//! let index = store.ensure_index(&IndexSpec::from_config(&config, 1536)).await?;
//! store.upsert(&index, &records).await?;
//! let result = store.query(&index, &query_embedding, 3).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::IndexConfig;
use crate::document::{ChunkMetadata, IndexStats, IndexedRecord, QueryMatch, QueryResult};
use crate::error::{FailureKind, RagError, Result};
use crate::http::{HttpFailure, client_with_timeout, send_json};
use crate::vectorstore::{IndexHandle, IndexSpec, Metric, VectorStore};

const BACKEND: &str = "Pinecone";
const API_VERSION: &str = "2025-01";
const UPSERT_BATCH_SIZE: usize = 100;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
const READY_POLL_ATTEMPTS: u32 = 60;

type Exchange<T> = std::result::Result<T, HttpFailure>;

/// A [`VectorStore`] backed by a [Pinecone](https://www.pinecone.io/) serverless index.
///
/// Records keep the metadata keys `text`, `source`, and `chunk_id`, so indexes
/// filled by other tools using the same layout can be queried directly.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: Option<String>,
    control_plane_url: String,
}

impl PineconeVectorStore {
    /// Create a store from configuration.
    ///
    /// A missing API key is accepted here and reported on the first call.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(config.timeout())?,
            api_key: config.api_key.clone(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
        })
    }

    fn failure(kind: FailureKind, message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), kind, message: message.into() }
    }

    fn map_failure(operation: &'static str) -> impl FnOnce(HttpFailure) -> RagError {
        move |HttpFailure { kind, message }| {
            error!(backend = BACKEND, operation, %kind, error = %message, "request failed");
            Self::failure(kind, message)
        }
    }

    fn api_key(&self) -> Exchange<&str> {
        self.api_key.as_deref().ok_or_else(|| HttpFailure {
            kind: FailureKind::MissingCredentials,
            message: "API key is not configured".to_string(),
        })
    }

    fn get(&self, url: String) -> Exchange<reqwest::RequestBuilder> {
        Ok(self
            .client
            .get(url)
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", API_VERSION))
    }

    fn post<T: Serialize + ?Sized>(
        &self,
        url: String,
        body: &T,
    ) -> Exchange<reqwest::RequestBuilder> {
        Ok(self
            .client
            .post(url)
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body))
    }

    async fn send<T: DeserializeOwned>(request: Exchange<reqwest::RequestBuilder>) -> Exchange<T> {
        send_json(request?).await
    }

    async fn describe(&self, name: &str) -> Exchange<IndexDescription> {
        Self::send(self.get(format!("{}/indexes/{name}", self.control_plane_url))).await
    }

    async fn create(&self, spec: &IndexSpec) -> Exchange<IndexDescription> {
        info!(
            backend = BACKEND,
            index = %spec.name,
            dimension = spec.dimension,
            cloud = %spec.cloud,
            region = %spec.region,
            "creating index"
        );
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric,
            spec: ServerlessSpec {
                serverless: ServerlessLocation { cloud: &spec.cloud, region: &spec.region },
            },
        };
        match Self::send(self.post(format!("{}/indexes", self.control_plane_url), &body)).await {
            Err(HttpFailure { kind: FailureKind::Status(409), .. }) => {
                debug!(backend = BACKEND, index = %spec.name, "index created concurrently");
                self.describe(&spec.name).await
            }
            other => other,
        }
    }

    async fn wait_until_ready(
        &self,
        mut description: IndexDescription,
    ) -> Exchange<IndexDescription> {
        let mut attempts = 0;
        while !description.is_ready() {
            if attempts == READY_POLL_ATTEMPTS {
                return Err(HttpFailure {
                    kind: FailureKind::Timeout,
                    message: format!("index '{}' did not become ready", description.name),
                });
            }
            attempts += 1;
            debug!(backend = BACKEND, index = %description.name, attempts, "waiting for index");
            tokio::time::sleep(READY_POLL_INTERVAL).await;
            description = self.describe(&description.name).await?;
        }
        Ok(description)
    }

    /// Data-plane URL for `path` on the index host.
    fn data_url(index: &IndexHandle, path: &str) -> String {
        let host = index.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}{path}")
        } else {
            format!("https://{host}{path}")
        }
    }
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    serverless: ServerlessLocation<'a>,
}

#[derive(Serialize)]
struct ServerlessLocation<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    dimension: usize,
    host: String,
    #[serde(default)]
    status: Option<IndexStatus>,
}

impl IndexDescription {
    fn is_ready(&self) -> bool {
        self.status.as_ref().is_none_or(|s| s.ready)
    }

    fn into_handle(self) -> IndexHandle {
        IndexHandle { name: self.name, host: self.host, dimension: self.dimension }
    }
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    ready: bool,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexedRecord],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Deserialize)]
struct WireMatch {
    id: String,
    score: f32,
    metadata: ChunkMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    dimension: Option<usize>,
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexHandle> {
        let description = match self.describe(&spec.name).await {
            Ok(description) => {
                debug!(backend = BACKEND, index = %spec.name, "index already exists");
                description
            }
            Err(HttpFailure { kind: FailureKind::Status(404), .. }) => {
                self.create(spec).await.map_err(Self::map_failure("create_index"))?
            }
            Err(failure) => return Err(Self::map_failure("describe_index")(failure)),
        };
        let description =
            self.wait_until_ready(description).await.map_err(Self::map_failure("describe_index"))?;
        Ok(description.into_handle())
    }

    async fn upsert(&self, index: &IndexHandle, records: &[IndexedRecord]) -> Result<()> {
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let url = Self::data_url(index, "/vectors/upsert");
            let request = self.post(url, &UpsertRequest { vectors: batch });
            let response: UpsertResponse =
                Self::send(request).await.map_err(Self::map_failure("upsert"))?;
            debug!(
                backend = BACKEND,
                index = %index.name,
                upserted = response.upserted_count,
                "upserted vectors"
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        index: &IndexHandle,
        vector: &[f32],
        top_k: usize,
    ) -> Result<QueryResult> {
        let body = QueryRequest { vector, top_k, include_metadata: true, include_values: false };
        let request = self.post(Self::data_url(index, "/query"), &body);
        let response: QueryResponse =
            Self::send(request).await.map_err(Self::map_failure("query"))?;

        let matches = response
            .matches
            .into_iter()
            .map(|m| QueryMatch { id: m.id, score: m.score, metadata: m.metadata })
            .collect();
        Ok(QueryResult::ranked(matches, top_k))
    }

    async fn stats(&self, index: &IndexHandle) -> Result<IndexStats> {
        let request =
            self.post(Self::data_url(index, "/describe_index_stats"), &serde_json::json!({}));
        let response: StatsResponse =
            Self::send(request).await.map_err(Self::map_failure("describe_index_stats"))?;
        Ok(IndexStats {
            total_vector_count: response.total_vector_count,
            dimension: response.dimension,
        })
    }
}
