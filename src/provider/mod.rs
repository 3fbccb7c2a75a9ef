//! Hosted embedding and chat-completion providers.
//!
//! The rest of the crate only sees the two capability traits, [`Embedder`] and
//! [`ChatModel`]. Concrete clients talk to OpenAI or to a local Ollama server;
//! [`testing`] holds deterministic stand-ins.

pub mod ollama;
pub mod openai;
pub mod testing;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ProviderConfig, ProviderKind};
use crate::documents::EmbeddingSignature;

pub use ollama::{OllamaChatModel, OllamaEmbedder};
pub use openai::{OpenAiChatModel, OpenAiClient, OpenAiEmbedder};
pub use types::{ChatMessage, Role};

/// Errors from provider calls.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API key not set. Export {0} or add it to a .env file.")]
    MissingApiKey(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Requested {expected} embeddings but received {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Turns text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider and model identity, recorded in the store manifest.
    fn signature(&self) -> EmbeddingSignature;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or(ProviderError::EmptyResponse)
    }
}

/// Produces a completion for a chat prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send the messages and return the assistant's reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String>;
}

/// Build the configured embedder.
pub fn embedder_from_config(config: &ProviderConfig) -> Arc<dyn Embedder> {
    let model = config.effective_embedding_model();
    match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiEmbedder::new(
            OpenAiClient::from_config(config),
            model,
        )),
        ProviderKind::Ollama => Arc::new(OllamaEmbedder::new(config.effective_base_url(), model)),
    }
}

/// Build the configured chat model.
pub fn chat_model_from_config(config: &ProviderConfig) -> Arc<dyn ChatModel> {
    let model = config.effective_chat_model();
    match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiChatModel::new(
            OpenAiClient::from_config(config),
            model,
        )),
        ProviderKind::Ollama => Arc::new(OllamaChatModel::new(config.effective_base_url(), model)),
    }
}

/// Check that a batch response holds one vector per input.
pub(crate) fn check_count(expected: usize, vectors: &[Vec<f32>]) -> ProviderResult<()> {
    if vectors.len() != expected {
        return Err(ProviderError::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    Ok(())
}

/// Read a non-success response into [`ProviderError::Api`].
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Api { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_follow_kind() {
        let mut config = ProviderConfig::default();
        assert_eq!(
            embedder_from_config(&config).signature(),
            EmbeddingSignature::new("openai", "text-embedding-3-small")
        );
        assert_eq!(chat_model_from_config(&config).model_name(), "gpt-4o-mini");

        config.kind = ProviderKind::Ollama;
        assert_eq!(embedder_from_config(&config).signature().provider, "ollama");
        assert_eq!(chat_model_from_config(&config).model_name(), "llama3.2");
    }
}
