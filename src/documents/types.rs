//! Core types for document chunks.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Unique identifier for a document chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(NonZeroU32);

impl ChunkId {
    /// Create a new ChunkId from a non-zero value.
    pub fn new(value: NonZeroU32) -> Self {
        Self(value)
    }

    /// Create a ChunkId from a u32, returning None if zero.
    pub fn from_u32(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Get the inner value as u32.
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

/// A chunk of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique identifier for this chunk.
    pub id: ChunkId,

    /// Path to the source document.
    pub source_path: PathBuf,

    /// Byte range in the source document (start, end).
    pub byte_range: (usize, usize),

    /// The actual text content of this chunk.
    pub content: String,
}

impl DocumentChunk {
    /// Create a new document chunk.
    pub fn new(
        id: ChunkId,
        source_path: PathBuf,
        byte_range: (usize, usize),
        content: String,
    ) -> Self {
        Self {
            id,
            source_path,
            byte_range,
            content,
        }
    }

    /// Get a preview of the content (first N characters).
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((end, _)) => &self.content[..end],
            None => &self.content,
        }
    }

    /// Get the length of the content in characters.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
