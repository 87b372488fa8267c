//! OpenAI-compatible embedding and chat-completion gateways.
//!
//! This module is only available when the `openai` feature is enabled. Any
//! provider exposing the OpenAI `/embeddings` and `/chat/completions` shapes
//! works by pointing `base_url` at it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::{CompletionProvider, GenerationParams};
use crate::config::{CompletionConfig, EmbeddingConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{FailureKind, RagError, Result};
use crate::http::{HttpFailure, client_with_timeout, send_json};
use crate::prompt::{Conversation, Message};

const PROVIDER: &str = "OpenAI";

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use ragdoc_rag::config::EmbeddingConfig;
/// use ragdoc_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new(&EmbeddingConfig::default())?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    url: String,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider from configuration.
    ///
    /// A missing API key is accepted here and reported on the first call.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(config.timeout())?,
            api_key: config.api_key.clone(),
            url: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn failure(kind: FailureKind, message: impl Into<String>) -> RagError {
        RagError::EmbeddingError { provider: PROVIDER.into(), kind, message: message.into() }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Self::failure(FailureKind::MissingCredentials, "API key is not configured"));
        };

        debug!(provider = PROVIDER, text_len = text.len(), model = %self.model, "embedding text");

        let request = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest { input: text, model: &self.model });

        let response: EmbeddingResponse =
            send_json(request).await.map_err(|HttpFailure { kind, message }| {
                error!(provider = PROVIDER, %kind, error = %message, "embedding request failed");
                Self::failure(kind, message)
            })?;

        response.data.into_iter().next().map(|d| d.embedding).ok_or_else(|| {
            error!(provider = PROVIDER, "embedding response contained no data");
            Self::failure(FailureKind::MalformedResponse, "API response contained no embedding")
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`CompletionProvider`] backed by an OpenAI-compatible chat completions API.
pub struct OpenAICompletionProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    url: String,
}

impl OpenAICompletionProvider {
    /// Create a provider from configuration.
    ///
    /// A missing API key is accepted here and reported on the first call.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(config.timeout())?,
            api_key: config.api_key.clone(),
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    fn failure(kind: FailureKind, message: impl Into<String>) -> RagError {
        RagError::CompletionError { provider: PROVIDER.into(), kind, message: message.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAICompletionProvider {
    async fn complete(
        &self,
        conversation: &Conversation,
        params: &GenerationParams,
    ) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Self::failure(FailureKind::MissingCredentials, "API key is not configured"));
        };

        debug!(
            provider = PROVIDER,
            model = %params.model,
            messages = conversation.len(),
            max_tokens = params.max_tokens,
            "requesting completion"
        );

        let request = self.client.post(&self.url).bearer_auth(api_key).json(&ChatRequest {
            messages: conversation.messages(),
            model: &params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        });

        let response: ChatResponse =
            send_json(request).await.map_err(|HttpFailure { kind, message }| {
                error!(provider = PROVIDER, %kind, error = %message, "completion request failed");
                Self::failure(kind, message)
            })?;

        response.choices.into_iter().next().and_then(|c| c.message.content).ok_or_else(|| {
            error!(provider = PROVIDER, "completion response contained no content");
            Self::failure(FailureKind::MalformedResponse, "API response contained no choices")
        })
    }
}
