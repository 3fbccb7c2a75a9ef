//! OpenAI client for the `/v1/embeddings` and `/v1/chat/completions` endpoints.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    ChatMessage, ChatModel, Embedder, ProviderError, ProviderResult, api_error, check_count,
};
use crate::config::ProviderConfig;
use crate::documents::EmbeddingSignature;

/// Shared HTTP plumbing for the OpenAI endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    /// Resolved lazily: a missing key only fails once a request is made.
    api_key: Option<SecretString>,
    api_key_env: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<String>, api_key_env: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url),
            api_key: api_key.map(SecretString::new),
            api_key_env: api_key_env.to_string(),
        }
    }

    /// Build from settings, reading the key from the configured variable.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::new(&config.effective_base_url(), api_key, &config.api_key_env)
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .ok_or_else(|| ProviderError::MissingApiKey(self.api_key_env.clone()))
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> ProviderResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = endpoint(&self.base_url, path);
        tracing::debug!(target: "provider", "POST {url}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<Resp>().await?)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Join `path` onto the base URL, adding `/v1` unless the base already has it.
fn endpoint(base_url: &str, path: &str) -> String {
    if base_url.ends_with("/v1") {
        format!("{base_url}/{path}")
    } else {
        format!("{base_url}/v1/{path}")
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embeddings through `/v1/embeddings`.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn signature(&self) -> EmbeddingSignature {
        EmbeddingSignature::new("openai", &self.model)
    }

    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let mut response: EmbeddingResponse = self.client.post("embeddings", &request).await?;

        response.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        check_count(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions through `/v1/chat/completions`.
pub struct OpenAiChatModel {
    client: OpenAiClient,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };
        let response: CompletionResponse = self.client.post("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}
