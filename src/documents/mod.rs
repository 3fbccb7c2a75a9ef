//! Document chunking and vector storage for RAG use cases.
//!
//! This module provides:
//! - Document chunking with configurable strategies
//! - A persistent chunk store holding one embedding per chunk
//! - Nearest-neighbour search over the stored embeddings

pub mod chunker;
pub mod config;
pub mod schema;
pub mod store;
pub mod types;

pub use chunker::{Chunker, FixedWindowChunker, RawChunk, SeparatorChunker, chunker_for};
pub use config::{ChunkingConfig, ChunkingStrategy};
pub use schema::DocumentSchema;
pub use store::{
    EmbeddingSignature, SearchResult, StoreError, StoreManifest, StoreResult, VectorIndex,
    VectorStore, cosine_similarity,
};
pub use types::{ChunkId, DocumentChunk};
