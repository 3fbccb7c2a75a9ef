//! Persistent chunk store with tantivy storage and brute-force vector search.
//!
//! Layout of a store directory:
//! - `tantivy/` - one document per chunk, embedding stored as bytes
//! - `manifest.json` - which embedding model produced the vectors
//!
//! The store is written once in a single bulk commit and only read afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tantivy::collector::DocSetCollector;
use tantivy::directory::MmapDirectory;
use tantivy::directory::error::OpenDirectoryError;
use tantivy::query::AllQuery;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument};
use thiserror::Error;

use super::schema::{DocumentSchema, decode_embedding, encode_embedding};
use super::types::{ChunkId, DocumentChunk};

/// Current manifest layout version.
pub const MANIFEST_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const INDEX_DIR: &str = "tantivy";

/// Tantivy writer heap size in bytes.
const WRITER_HEAP_SIZE: usize = 50_000_000;

/// Errors from store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Directory error: {0}")]
    Directory(#[from] OpenDirectoryError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Vector store not found at {0}. Run `docchat ingest` first.")]
    NotFound(PathBuf),

    #[error(
        "Vector store was built with embedding model '{stored}' but '{configured}' is configured"
    )]
    ModelMismatch { stored: String, configured: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt chunk document: {0}")]
    CorruptDocument(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Identifies the embedding space vectors live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSignature {
    /// Provider kind (e.g. "openai").
    pub provider: String,
    /// Model identifier passed to the provider.
    pub model: String,
}

impl EmbeddingSignature {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl std::fmt::Display for EmbeddingSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Persisted description of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub version: u32,
    pub embedding: EmbeddingSignature,
    pub dimension: usize,
    pub chunk_count: usize,
    /// UTC seconds.
    pub created_at: u64,
}

/// A chunk returned by a nearest-neighbour lookup.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    /// Cosine similarity to the query (-1.0 - 1.0).
    pub similarity: f32,
}

/// Nearest-neighbour lookup over stored chunk vectors.
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` chunks ordered by decreasing similarity to `query`.
    fn nearest(&self, query: &[f32], k: usize) -> StoreResult<Vec<SearchResult>>;
}

/// On-disk chunk store.
pub struct VectorStore {
    /// Base path for all storage files.
    base_path: PathBuf,

    /// Tantivy index holding chunks and their vectors.
    index: Index,

    /// Index reader for queries.
    reader: IndexReader,

    /// Schema fields.
    schema: DocumentSchema,

    manifest: StoreManifest,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("base_path", &self.base_path)
            .field("manifest", &self.manifest)
            .finish()
    }
}

impl VectorStore {
    /// Whether a store directory exists at `base_path`.
    pub fn exists(base_path: impl AsRef<Path>) -> bool {
        base_path.as_ref().exists()
    }

    /// Create a new, empty store.
    ///
    /// # Arguments
    /// * `base_path` - Directory for all storage files
    /// * `embedding` - Provider and model the vectors come from
    /// * `dimension` - Vector dimension for embeddings
    pub fn create(
        base_path: impl AsRef<Path>,
        embedding: EmbeddingSignature,
        dimension: usize,
    ) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let index_path = base_path.join(INDEX_DIR);
        std::fs::create_dir_all(&index_path)?;

        let (tantivy_schema, document_schema) = DocumentSchema::build();
        let dir = MmapDirectory::open(&index_path)?;
        let index = Index::create(dir, tantivy_schema, IndexSettings::default())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        let manifest = StoreManifest {
            version: MANIFEST_VERSION,
            embedding,
            dimension,
            chunk_count: 0,
            created_at: utc_timestamp(),
        };

        let store = Self {
            base_path,
            index,
            reader,
            schema: document_schema,
            manifest,
        };
        store.save_manifest()?;

        tracing::debug!(target: "store", "created store at {}", store.base_path.display());
        Ok(store)
    }

    /// Open an existing store.
    pub fn open(base_path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let manifest_path = base_path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(StoreError::NotFound(base_path));
        }

        let manifest: StoreManifest =
            serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)?;

        let index = Index::open_in_dir(base_path.join(INDEX_DIR))?;
        let schema = DocumentSchema::from_schema(&index.schema())?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        reader.reload()?;

        tracing::debug!(
            target: "store",
            "opened store at {} ({} chunks, {})",
            base_path.display(),
            manifest.chunk_count,
            manifest.embedding
        );

        Ok(Self {
            base_path,
            index,
            reader,
            schema,
            manifest,
        })
    }

    /// Open an existing store and check it was built with `expected` embeddings.
    pub fn open_for(base_path: impl AsRef<Path>, expected: &EmbeddingSignature) -> StoreResult<Self> {
        let store = Self::open(base_path)?;
        if &store.manifest.embedding != expected {
            return Err(StoreError::ModelMismatch {
                stored: store.manifest.embedding.to_string(),
                configured: expected.to_string(),
            });
        }
        Ok(store)
    }

    /// Write all chunks and their vectors in a single commit.
    pub fn add_chunks(&mut self, entries: &[(DocumentChunk, Vec<f32>)]) -> StoreResult<usize> {
        for (_, vector) in entries {
            self.check_dimension(vector.len())?;
        }

        let mut writer: IndexWriter<TantivyDocument> = self.index.writer(WRITER_HEAP_SIZE)?;
        let indexed_at = utc_timestamp();

        for (chunk, vector) in entries {
            let mut doc = TantivyDocument::new();
            doc.add_u64(self.schema.chunk_id, u64::from(chunk.id.get()));
            doc.add_text(
                self.schema.source_path,
                chunk.source_path.to_string_lossy().as_ref(),
            );
            doc.add_text(self.schema.content, &chunk.content);
            doc.add_u64(self.schema.byte_start, chunk.byte_range.0 as u64);
            doc.add_u64(self.schema.byte_end, chunk.byte_range.1 as u64);
            doc.add_u64(self.schema.char_count, chunk.char_count() as u64);
            doc.add_bytes(self.schema.embedding, encode_embedding(vector).as_slice());
            doc.add_u64(self.schema.indexed_at, indexed_at);
            writer.add_document(doc)?;
        }

        writer.commit()?;
        self.reader.reload()?;

        self.manifest.chunk_count += entries.len();
        self.save_manifest()?;

        tracing::info!(target: "store", "committed {} chunks", entries.len());
        Ok(entries.len())
    }

    /// Number of chunks in the store.
    pub fn len(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// All stored chunks ordered by id.
    pub fn chunks(&self) -> StoreResult<Vec<DocumentChunk>> {
        let searcher = self.reader.searcher();
        let mut chunks = Vec::new();
        for address in searcher.search(&AllQuery, &DocSetCollector)? {
            let doc: TantivyDocument = searcher.doc(address)?;
            chunks.push(self.chunk_from_doc(&doc)?);
        }
        chunks.sort_by_key(|c| c.id);
        Ok(chunks)
    }

    fn check_dimension(&self, actual: usize) -> StoreResult<()> {
        if actual != self.manifest.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.manifest.dimension,
                actual,
            });
        }
        Ok(())
    }

    fn chunk_from_doc(&self, doc: &TantivyDocument) -> StoreResult<DocumentChunk> {
        let id = doc
            .get_first(self.schema.chunk_id)
            .and_then(|v| v.as_u64())
            .and_then(|id| u32::try_from(id).ok())
            .and_then(ChunkId::from_u32)
            .ok_or_else(|| StoreError::CorruptDocument("missing chunk_id".to_string()))?;

        let source_path = doc
            .get_first(self.schema.source_path)
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_default();

        let content = doc
            .get_first(self.schema.content)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let byte_start = doc
            .get_first(self.schema.byte_start)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let byte_end = doc
            .get_first(self.schema.byte_end)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        Ok(DocumentChunk::new(
            id,
            source_path,
            (byte_start, byte_end),
            content,
        ))
    }

    fn vector_from_doc(&self, doc: &TantivyDocument) -> StoreResult<Vec<f32>> {
        doc.get_first(self.schema.embedding)
            .and_then(|v| v.as_bytes())
            .and_then(decode_embedding)
            .ok_or_else(|| StoreError::CorruptDocument("missing or invalid embedding".to_string()))
    }

    fn save_manifest(&self) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(self.base_path.join(MANIFEST_FILE), content)?;
        Ok(())
    }
}

impl VectorIndex for VectorStore {
    fn nearest(&self, query: &[f32], k: usize) -> StoreResult<Vec<SearchResult>> {
        self.check_dimension(query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let mut scored = Vec::new();

        for address in searcher.search(&AllQuery, &DocSetCollector)? {
            let doc: TantivyDocument = searcher.doc(address)?;
            let vector = self.vector_from_doc(&doc)?;
            let similarity = cosine_similarity(query, &vector);
            scored.push(SearchResult {
                chunk: self.chunk_from_doc(&doc)?,
                similarity,
            });
        }

        // Highest similarity first, lower chunk id breaks ties
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);

        tracing::debug!(
            target: "store",
            "nearest: {} of {} chunks returned",
            scored.len(),
            self.manifest.chunk_count
        );
        Ok(scored)
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

fn utc_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
