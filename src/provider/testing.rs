//! Deterministic stand-ins for the hosted providers.
//!
//! Used by the test suites so the ingestion and chat pipelines run without
//! network access.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::{ChatMessage, ChatModel, Embedder, ProviderError, ProviderResult};
use crate::documents::EmbeddingSignature;

/// Bag-of-words embedder: every lowercase alphanumeric token is hashed into a
/// bucket and the bucket counts are L2-normalised.
///
/// Texts that share words land close together, which is enough to make
/// nearest-neighbour results predictable in tests.
#[derive(Debug)]
pub struct HashingEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed_batch` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let idx = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            vector[idx] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn signature(&self) -> EmbeddingSignature {
        EmbeddingSignature::new("hashing", format!("bow-{}", self.dimension))
    }

    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

type Responder = Box<dyn Fn(&[ChatMessage]) -> ProviderResult<String> + Send + Sync>;

/// Chat model driven by a closure; records every prompt it receives.
pub struct ScriptedChatModel {
    responder: Responder,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> ProviderResult<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Fail every call with a 500 API error.
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(ProviderError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            })
        })
    }

    /// Every prompt received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        self.requests.lock().push(messages.to_vec());
        (self.responder)(messages)
    }
}
