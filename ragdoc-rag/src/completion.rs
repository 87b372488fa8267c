//! Completion provider trait for generating grounded answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::error::Result;
use crate::prompt::Conversation;

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Chat model identifier.
    pub model: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl From<&CompletionConfig> for GenerationParams {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&CompletionConfig::default())
    }
}

/// A provider that turns a conversation into generated text.
///
/// Each call is stateless and independent: no streaming, no retries, and no
/// memory of earlier calls.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a reply to `conversation`.
    async fn complete(
        &self,
        conversation: &Conversation,
        params: &GenerationParams,
    ) -> Result<String>;
}
