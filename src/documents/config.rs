//! Configuration types for document chunking.

use serde::{Deserialize, Serialize};

/// Configuration for document chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Chunking strategy to use.
    #[serde(default)]
    pub strategy: ChunkingStrategy,

    /// Maximum chunk size in characters. Larger text is split.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Overlap between adjacent chunks in characters.
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,

    /// Separator used by the `separator` strategy.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_max_chunk_chars() -> usize {
    1000
}

fn default_overlap_chars() -> usize {
    100
}

fn default_separator() -> String {
    "\n\n".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::default(),
            max_chunk_chars: default_max_chunk_chars(),
            overlap_chars: default_overlap_chars(),
            separator: default_separator(),
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_chars == 0 {
            return Err("max_chunk_chars must be greater than zero".to_string());
        }

        if self.overlap_chars >= self.max_chunk_chars {
            return Err(format!(
                "overlap_chars ({}) must be less than max_chunk_chars ({})",
                self.overlap_chars, self.max_chunk_chars
            ));
        }

        if self.strategy == ChunkingStrategy::Separator && self.separator.is_empty() {
            return Err("separator must not be empty for the separator strategy".to_string());
        }

        Ok(())
    }
}

/// Strategy for splitting documents into chunks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Sliding character window: fixed-size cuts with a fixed overlap.
    #[default]
    Fixed,
    /// Split on a separator, then greedily merge pieces up to the size limit.
    /// A single piece longer than the limit is kept whole.
    Separator,
}
