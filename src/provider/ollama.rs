//! Ollama client for the `/api/embed` and `/api/chat` endpoints.
//!
//! Ollama runs locally and needs no credentials.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    ChatMessage, ChatModel, Embedder, ProviderError, ProviderResult, api_error, check_count,
};
use crate::documents::EmbeddingSignature;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct OllamaEmbedder {
    base_url: String,
    client: Client,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            model,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn signature(&self) -> EmbeddingSignature {
        EmbeddingSignature::new("ollama", &self.model)
    }

    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        tracing::debug!(target: "provider", "POST {url}");

        let res = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error(res).await);
        }

        let payload: EmbedResponse = res.json().await?;
        check_count(texts.len(), &payload.embeddings)?;
        Ok(payload.embeddings)
    }
}

pub struct OllamaChatModel {
    base_url: String,
    client: Client,
    model: String,
}

impl OllamaChatModel {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            model,
        }
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(target: "provider", "POST {url}");

        let res = self
            .client
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                stream: false,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error(res).await);
        }

        let payload: ChatResponse = res.json().await?;
        payload
            .message
            .map(|m| m.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_batch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embed")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "nomic-embed-text",
                "input": ["hello"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"nomic-embed-text","embeddings":[[0.5,0.5]]}"#)
            .create_async()
            .await;

        let embedder = OllamaEmbedder::new(server.url(), "nomic-embed-text".to_string());
        let vector = embedder.embed("hello").await.unwrap();

        assert_eq!(vector, vec![0.5, 0.5]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_count_mismatch() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embeddings":[[1.0]]}"#)
            .create_async()
            .await;

        let embedder = OllamaEmbedder::new(server.url(), "nomic-embed-text".to_string());
        let err = embedder
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_chat_is_not_streamed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "stream": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":{"role":"assistant","content":"Blue."},"done":true}"#)
            .create_async()
            .await;

        let chat = OllamaChatModel::new(format!("{}/", server.url()), "llama3.2".to_string());
        let answer = chat.complete(&[ChatMessage::user("sky?")]).await.unwrap();

        assert_eq!(answer, "Blue.");
        mock.assert_async().await;
    }
}
