//! Similarity retrieval over the chunk store.

use std::sync::Arc;

use thiserror::Error;

use crate::documents::{SearchResult, StoreError, VectorIndex};
use crate::provider::{Embedder, ProviderError};

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("Failed to embed query: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Embeds a query and returns the `top_k` closest chunks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Chunks ordered by decreasing similarity to `query`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, RetrieveError> {
        let vector = self.embedder.embed(query).await?;
        let results = self.index.nearest(&vector, self.top_k)?;

        tracing::debug!(
            target: "chat",
            "retrieved {} chunks (best {:.3})",
            results.len(),
            results.first().map(|r| r.similarity).unwrap_or_default()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{ChunkId, DocumentChunk, EmbeddingSignature, VectorStore};
    use crate::provider::testing::HashingEmbedder;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn store_with(texts: &[&str], embedder: &HashingEmbedder, dir: &TempDir) -> VectorStore {
        let mut store = VectorStore::create(
            dir.path().join("store"),
            EmbeddingSignature::new("hashing", "bow-64"),
            64,
        )
        .unwrap();
        let entries: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let chunk = DocumentChunk::new(
                    ChunkId::from_u32(i as u32 + 1).unwrap(),
                    PathBuf::from("docs/facts.txt"),
                    (0, text.len()),
                    text.to_string(),
                );
                (chunk, embedder.vector_for(text))
            })
            .collect();
        store.add_chunks(&entries).unwrap();
        store
    }

    #[tokio::test]
    async fn test_stored_text_comes_back_first() {
        let dir = TempDir::new().unwrap();
        let embedder = Arc::new(HashingEmbedder::new(64));
        let texts = [
            "Rust guarantees memory safety without a garbage collector.",
            "The sky is blue because of Rayleigh scattering.",
            "Bread rises when yeast ferments sugar.",
        ];
        let store = store_with(&texts, &embedder, &dir);

        let retriever = Retriever::new(embedder.clone(), Arc::new(store), 2);
        let results = retriever.retrieve(texts[1]).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, texts[1]);
        assert!((results[0].similarity - 1.0).abs() < 1e-4);
        assert_eq!(embedder.calls(), 1);
    }

    #[test]
    fn test_top_k_is_at_least_one() {
        let dir = TempDir::new().unwrap();
        let embedder = Arc::new(HashingEmbedder::new(64));
        let store = store_with(&["only"], &embedder, &dir);

        let retriever = Retriever::new(embedder, Arc::new(store), 0);
        assert_eq!(retriever.top_k(), 1);
    }
}
