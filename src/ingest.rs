//! Document ingestion: discover, chunk, embed and persist.
//!
//! Runs once per store. An existing store directory short-circuits the whole
//! pipeline unless `force` is set, and nothing is written to disk until every
//! chunk has been embedded.

use std::io::Write;
use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::config::Settings;
use crate::documents::{ChunkId, DocumentChunk, StoreError, VectorStore, chunker_for};
use crate::provider::{Embedder, ProviderError};

/// Characters of the sample chunk shown in the ingestion summary.
const SAMPLE_PREVIEW_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Documents directory {0} does not exist")]
    DocsDirMissing(PathBuf),

    #[error("No .txt files found in {0}")]
    NoTextFiles(PathBuf),

    #[error("Documents in {0} produced no chunks")]
    NoChunks(PathBuf),

    #[error("Invalid chunking configuration: {0}")]
    InvalidChunking(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to list documents: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Embedding failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub chunks: usize,
    pub dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The store directory already existed; nothing was done.
    Skipped { store_dir: PathBuf },
    Created(IngestStats),
}

/// Build the vector store from the documents directory.
///
/// Progress and the chunk summary go to `out`; logs go through `tracing`.
pub async fn run_ingest(
    settings: &Settings,
    embedder: &dyn Embedder,
    force: bool,
    out: &mut dyn Write,
) -> Result<IngestOutcome, IngestError> {
    let docs_dir = &settings.paths.docs_dir;
    let store_dir = &settings.paths.store_dir;

    if VectorStore::exists(store_dir) && !force {
        tracing::info!(target: "ingest", "store exists at {}, skipping", store_dir.display());
        writeln!(
            out,
            "{}",
            style(format!(
                "Vector store already exists at {}. No need to initialize.",
                store_dir.display()
            ))
            .blue()
        )?;
        return Ok(IngestOutcome::Skipped {
            store_dir: store_dir.clone(),
        });
    }

    settings
        .chunking
        .validate()
        .map_err(IngestError::InvalidChunking)?;

    if !docs_dir.is_dir() {
        return Err(IngestError::DocsDirMissing(docs_dir.clone()));
    }

    let files = discover_text_files(docs_dir)?;
    if files.is_empty() {
        return Err(IngestError::NoTextFiles(docs_dir.clone()));
    }
    writeln!(
        out,
        "{} {}",
        style("Vector store does not exist.").red(),
        style("Initializing vector store...").green()
    )?;

    let chunks = chunk_files(&files, settings)?;
    if chunks.is_empty() {
        return Err(IngestError::NoChunks(docs_dir.clone()));
    }

    writeln!(out, "\n{}", style("--- Document Chunks Information ---").magenta())?;
    writeln!(
        out,
        "Number of document chunks: {}",
        style(chunks.len()).yellow()
    )?;
    writeln!(
        out,
        "Sample chunk:\n{}\n",
        style(chunks[0].preview(SAMPLE_PREVIEW_CHARS)).blue()
    )?;

    writeln!(out, "{}", style("--- Creating embeddings ---").green())?;
    let vectors = embed_chunks(&chunks, embedder, settings).await?;
    writeln!(out, "{}", style("--- Finished creating embeddings ---").green())?;

    let dimension = vectors.first().map(Vec::len).unwrap_or_default();

    if force && VectorStore::exists(store_dir) {
        tracing::info!(target: "ingest", "removing existing store at {}", store_dir.display());
        std::fs::remove_dir_all(store_dir)?;
    }

    writeln!(out, "{}", style("--- Creating vector store ---").cyan())?;
    let entries: Vec<(DocumentChunk, Vec<f32>)> = chunks.into_iter().zip(vectors).collect();
    persist(store_dir, embedder, dimension, &entries)?;
    writeln!(out, "{}", style("--- Finished creating vector store ---").cyan())?;

    let stats = IngestStats {
        files: files.len(),
        chunks: entries.len(),
        dimension,
    };
    tracing::info!(
        target: "ingest",
        "ingested {} files into {} chunks ({}d)",
        stats.files,
        stats.chunks,
        stats.dimension
    );
    Ok(IngestOutcome::Created(stats))
}

/// `*.txt` files directly under `dir`, sorted by path.
pub fn discover_text_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.txt");

    let mut files = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    tracing::debug!(target: "ingest", "found {} text files in {}", files.len(), dir.display());
    Ok(files)
}

/// Chunk every file, allocating ids sequentially across files.
fn chunk_files(files: &[PathBuf], settings: &Settings) -> Result<Vec<DocumentChunk>, IngestError> {
    let chunker = chunker_for(settings.chunking.strategy);
    let mut chunks = Vec::new();
    let mut next_id: u32 = 1;

    for path in files {
        let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
            path: path.clone(),
            source,
        })?;

        let raw = chunker.chunk(&content, &settings.chunking);
        tracing::debug!(target: "ingest", "{}: {} chunks", path.display(), raw.len());

        for piece in raw {
            let Some(id) = ChunkId::from_u32(next_id) else {
                break;
            };
            next_id = next_id.saturating_add(1);
            chunks.push(DocumentChunk::new(
                id,
                path.clone(),
                piece.byte_range,
                piece.content,
            ));
        }
    }

    Ok(chunks)
}

async fn embed_chunks(
    chunks: &[DocumentChunk],
    embedder: &dyn Embedder,
    settings: &Settings,
) -> Result<Vec<Vec<f32>>, IngestError> {
    let batch_size = settings.embedding.batch_size.max(1);

    let progress = if settings.show_progress {
        let bar = ProgressBar::new(chunks.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} embedding [{bar:40}] {pos}/{len} chunks")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let embedded = match embedder.embed_batch(&texts).await {
            Ok(v) => v,
            Err(e) => {
                progress.abandon();
                return Err(e.into());
            }
        };
        if embedded.len() != texts.len() {
            progress.abandon();
            return Err(ProviderError::CountMismatch {
                expected: texts.len(),
                actual: embedded.len(),
            }
            .into());
        }
        vectors.extend(embedded);
        progress.inc(batch.len() as u64);
    }
    progress.finish_and_clear();

    Ok(vectors)
}

fn persist(
    store_dir: &Path,
    embedder: &dyn Embedder,
    dimension: usize,
    entries: &[(DocumentChunk, Vec<f32>)],
) -> Result<(), IngestError> {
    let result = VectorStore::create(store_dir, embedder.signature(), dimension)
        .and_then(|mut store| store.add_chunks(entries));

    if let Err(e) = result {
        // A half-written store would be skipped by the next run
        if let Err(cleanup) = std::fs::remove_dir_all(store_dir) {
            tracing::warn!(target: "ingest", "failed to remove partial store: {cleanup}");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{ChunkingStrategy, EmbeddingSignature};
    use crate::provider::ProviderResult;
    use crate::provider::testing::HashingEmbedder;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn settings_in(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.docs_dir = root.join("docs");
        settings.paths.store_dir = root.join("db").join("store");
        settings.show_progress = false;
        settings
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn signature(&self) -> EmbeddingSignature {
            EmbeddingSignature::new("failing", "none")
        }

        async fn embed_batch(&self, _texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
            Err(ProviderError::Api {
                status: 401,
                body: "invalid api key".to_string(),
            })
        }
    }

    #[test]
    fn test_discover_only_top_level_txt_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("notes.md"), "md").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();

        let files = discover_text_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_every_file_is_chunked() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        std::fs::create_dir_all(&settings.paths.docs_dir).unwrap();
        std::fs::write(settings.paths.docs_dir.join("a.txt"), "The sky is blue.").unwrap();
        std::fs::write(settings.paths.docs_dir.join("b.txt"), "Grass is green.").unwrap();

        let embedder = HashingEmbedder::new(32);
        let mut out = Vec::new();
        let outcome = run_ingest(&settings, &embedder, false, &mut out).await.unwrap();

        assert_eq!(
            outcome,
            IngestOutcome::Created(IngestStats {
                files: 2,
                chunks: 2,
                dimension: 32
            })
        );
        let store = VectorStore::open(&settings.paths.store_dir).unwrap();
        let sources: Vec<_> = store
            .chunks()
            .unwrap()
            .into_iter()
            .map(|c| c.source_path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(sources, vec!["a.txt", "b.txt"]);

        let printed = String::from_utf8(out).unwrap();
        let plain = console::strip_ansi_codes(&printed);
        assert!(plain.contains("Number of document chunks: 2"));
        assert!(plain.contains("Sample chunk:\nThe sky is blue."));
    }

    #[tokio::test]
    async fn test_status_lines_are_colored() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        std::fs::create_dir_all(&settings.paths.docs_dir).unwrap();
        std::fs::write(settings.paths.docs_dir.join("a.txt"), "The sky is blue.").unwrap();

        console::set_colors_enabled(true);
        let mut out = Vec::new();
        run_ingest(&settings, &HashingEmbedder::new(8), false, &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        let header = style("--- Document Chunks Information ---").magenta().to_string();
        assert!(printed.contains(&header));
        assert!(printed.contains(&style(1).yellow().to_string()));
        assert!(printed.contains(&style("--- Creating vector store ---").cyan().to_string()));
        assert!(printed.contains(&style("Vector store does not exist.").red().to_string()));
    }

    #[tokio::test]
    async fn test_existing_store_is_skipped_without_embedding() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        std::fs::create_dir_all(&settings.paths.store_dir).unwrap();

        let embedder = HashingEmbedder::default();
        let outcome = run_ingest(&settings, &embedder, false, &mut Vec::new())
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Skipped { .. }));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_docs_dir_and_no_txt_files() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let embedder = HashingEmbedder::default();

        let err = run_ingest(&settings, &embedder, false, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::DocsDirMissing(_)));

        std::fs::create_dir_all(&settings.paths.docs_dir).unwrap();
        std::fs::write(settings.paths.docs_dir.join("readme.md"), "not text").unwrap();
        let err = run_ingest(&settings, &embedder, false, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoTextFiles(_)));
        assert!(!settings.paths.store_dir.exists());
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_no_store() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        std::fs::create_dir_all(&settings.paths.docs_dir).unwrap();
        std::fs::write(settings.paths.docs_dir.join("a.txt"), "some text").unwrap();

        let err = run_ingest(&settings, &FailingEmbedder, false, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Provider(ProviderError::Api { status: 401, .. })));
        assert!(!settings.paths.store_dir.exists());
    }

    #[tokio::test]
    async fn test_force_rebuilds_store() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        std::fs::create_dir_all(&settings.paths.docs_dir).unwrap();
        std::fs::write(settings.paths.docs_dir.join("a.txt"), "x".repeat(250)).unwrap();

        let embedder = HashingEmbedder::new(16);
        run_ingest(&settings, &embedder, false, &mut Vec::new())
            .await
            .unwrap();

        settings.chunking.max_chunk_chars = 100;
        settings.chunking.overlap_chars = 30;
        settings.chunking.strategy = ChunkingStrategy::Fixed;
        let outcome = run_ingest(&settings, &embedder, true, &mut Vec::new())
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Created(IngestStats { chunks: 4, .. })));
        assert_eq!(VectorStore::open(&settings.paths.store_dir).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_batches_follow_batch_size() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        settings.embedding.batch_size = 2;
        std::fs::create_dir_all(&settings.paths.docs_dir).unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            std::fs::write(settings.paths.docs_dir.join(format!("{name}.txt")), name).unwrap();
        }

        let embedder = HashingEmbedder::new(8);
        run_ingest(&settings, &embedder, false, &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_chunking_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        settings.chunking.overlap_chars = settings.chunking.max_chunk_chars;

        let err = run_ingest(&settings, &HashingEmbedder::default(), false, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidChunking(_)));
    }
}
