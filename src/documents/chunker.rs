//! Document chunking strategies.
//!
//! Provides the `Chunker` trait and implementations for splitting documents
//! into chunks suitable for embedding. All sizes are measured in characters,
//! not bytes, so multi-byte text never gets cut inside a code point.

use std::collections::VecDeque;

use super::config::{ChunkingConfig, ChunkingStrategy};

/// A raw chunk before being assigned IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Byte range in the source document (start, end).
    pub byte_range: (usize, usize),

    /// The text content of this chunk.
    pub content: String,
}

impl RawChunk {
    /// Create a new raw chunk.
    pub fn new(byte_range: (usize, usize), content: String) -> Self {
        Self {
            byte_range,
            content,
        }
    }

    /// Get character count.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document content into chunks.
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<RawChunk>;
}

/// Pick the chunker implementation for a strategy.
pub fn chunker_for(strategy: ChunkingStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Fixed => Box::new(FixedWindowChunker::new()),
        ChunkingStrategy::Separator => Box::new(SeparatorChunker::new()),
    }
}

/// Fixed-size sliding window over characters.
///
/// Every chunk holds at most `max_chunk_chars` characters and the window
/// advances by `max_chunk_chars - overlap_chars`, so consecutive chunks share
/// exactly `overlap_chars` characters. Boundaries are naive length cuts.
#[derive(Debug, Default)]
pub struct FixedWindowChunker;

impl FixedWindowChunker {
    /// Create a new fixed window chunker.
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for FixedWindowChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<RawChunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, including the end of the string.
        let offsets: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let total_chars = offsets.len() - 1;

        let max_chars = config.max_chunk_chars.max(1);
        let step = max_chars.saturating_sub(config.overlap_chars).max(1);

        let mut chunks = Vec::new();
        let mut char_start = 0;
        loop {
            let char_end = (char_start + max_chars).min(total_chars);
            let (byte_start, byte_end) = (offsets[char_start], offsets[char_end]);

            chunks.push(RawChunk::new(
                (byte_start, byte_end),
                content[byte_start..byte_end].to_string(),
            ));

            if char_end >= total_chars {
                break;
            }
            char_start += step;
        }

        chunks
    }
}

/// Separator-aware chunker.
///
/// Algorithm:
/// 1. Split on `separator`, dropping empty pieces
/// 2. Greedily merge consecutive pieces (re-joined with the separator) while
///    the result fits in `max_chunk_chars`
/// 3. Start the next chunk with the trailing pieces of the previous one that
///    fit in `overlap_chars`
///
/// A piece longer than `max_chunk_chars` becomes its own oversized chunk.
#[derive(Debug, Default)]
pub struct SeparatorChunker;

impl SeparatorChunker {
    /// Create a new separator chunker.
    pub fn new() -> Self {
        Self
    }
}

/// A separator-delimited piece with its byte range in the source.
#[derive(Debug, Clone)]
struct Piece<'a> {
    byte_range: (usize, usize),
    text: &'a str,
    chars: usize,
}

impl Chunker for SeparatorChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<RawChunk> {
        if content.trim().is_empty() || config.separator.is_empty() {
            return Vec::new();
        }

        let pieces = split_pieces(content, &config.separator);
        merge_pieces(
            &pieces,
            &config.separator,
            config.max_chunk_chars,
            config.overlap_chars,
        )
    }
}

fn split_pieces<'a>(content: &'a str, separator: &str) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, _) in content.match_indices(separator) {
        push_piece(&mut pieces, content, start, idx);
        start = idx + separator.len();
    }
    push_piece(&mut pieces, content, start, content.len());

    pieces
}

fn push_piece<'a>(pieces: &mut Vec<Piece<'a>>, content: &'a str, start: usize, end: usize) {
    let text = &content[start..end];
    if !text.is_empty() {
        pieces.push(Piece {
            byte_range: (start, end),
            text,
            chars: text.chars().count(),
        });
    }
}

fn merge_pieces(
    pieces: &[Piece<'_>],
    separator: &str,
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<RawChunk> {
    let sep_chars = separator.chars().count();
    let mut chunks = Vec::new();
    let mut current: VecDeque<&Piece<'_>> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let joined_len = |total: usize, current: &VecDeque<&Piece<'_>>| {
            total + piece.chars + if current.is_empty() { 0 } else { sep_chars }
        };

        if joined_len(total, &current) > max_chars {
            if total > max_chars {
                tracing::debug!(
                    target: "ingest",
                    "created a chunk of {total} chars, longer than the limit of {max_chars}"
                );
            }

            if !current.is_empty() {
                push_merged(&mut chunks, &current, separator);

                // Keep trailing pieces for overlap while they fit.
                while total > overlap_chars
                    || (total > 0 && joined_len(total, &current) > max_chars)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= front.chars + if current.is_empty() { 0 } else { sep_chars };
                }
            }
        }

        total += piece.chars + if current.is_empty() { 0 } else { sep_chars };
        current.push_back(piece);
    }

    if !current.is_empty() {
        push_merged(&mut chunks, &current, separator);
    }

    chunks
}

fn push_merged(chunks: &mut Vec<RawChunk>, current: &VecDeque<&Piece<'_>>, separator: &str) {
    let (Some(first), Some(last)) = (current.front(), current.back()) else {
        return;
    };

    let joined = current
        .iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join(separator);
    let content = joined.trim();
    if content.is_empty() {
        return;
    }

    // Keep the range aligned with the trimmed text
    let leading = joined.len() - joined.trim_start().len();
    let trailing = joined.len() - joined.trim_end().len();

    chunks.push(RawChunk::new(
        (first.byte_range.0 + leading, last.byte_range.1 - trailing),
        content.to_string(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_config(max: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chunk_chars: max,
            overlap_chars: overlap,
            ..Default::default()
        }
    }

    fn separator_config(max: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            strategy: ChunkingStrategy::Separator,
            max_chunk_chars: max,
            overlap_chars: overlap,
            separator: "\n\n".to_string(),
        }
    }

    #[test]
    fn test_empty_content() {
        let chunker = FixedWindowChunker::new();
        assert!(chunker.chunk("", &fixed_config(100, 10)).is_empty());
        assert!(chunker.chunk("  \n\n ", &fixed_config(100, 10)).is_empty());
    }

    #[test]
    fn test_short_content_is_single_chunk() {
        let chunker = FixedWindowChunker::new();
        let content = "The sky is blue during the day.";
        let chunks = chunker.chunk(content, &fixed_config(1000, 100));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, content);
        assert_eq!(chunks[0].byte_range, (0, content.len()));
    }

    #[test]
    fn test_fixed_chunks_respect_max_size() {
        let chunker = FixedWindowChunker::new();
        let content = "word ".repeat(100);
        let config = fixed_config(100, 20);
        let chunks = chunker.chunk(&content, &config);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_count() <= config.max_chunk_chars);
        }
    }

    #[test]
    fn test_fixed_chunks_share_exact_overlap() {
        let chunker = FixedWindowChunker::new();
        let content: String = ('a'..='z').cycle().take(250).collect();
        let config = fixed_config(100, 30);
        let chunks = chunker.chunk(&content, &config);

        // 0..100, 70..170, 140..240, 210..250
        assert_eq!(chunks.len(), 4);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].content.chars().skip(70).collect();
            let head: String = pair[1].content.chars().take(30).collect();
            assert_eq!(tail, head);
        }
        assert_eq!(chunks[3].char_count(), 40);
    }

    #[test]
    fn test_fixed_chunks_cover_whole_document() {
        let chunker = FixedWindowChunker::new();
        let content = "0123456789".repeat(25);
        let chunks = chunker.chunk(&content, &fixed_config(100, 10));

        assert_eq!(chunks.first().unwrap().byte_range.0, 0);
        assert_eq!(chunks.last().unwrap().byte_range.1, content.len());
    }

    #[test]
    fn test_fixed_chunks_multibyte_boundaries() {
        let chunker = FixedWindowChunker::new();
        let content = "日本語のテキスト".repeat(10);
        let chunks = chunker.chunk(&content, &fixed_config(7, 2));

        for chunk in &chunks {
            let (start, end) = chunk.byte_range;
            assert_eq!(&content[start..end], chunk.content);
            assert!(chunk.char_count() <= 7);
        }
    }

    #[test]
    fn test_separator_merges_small_pieces() {
        let chunker = SeparatorChunker::new();
        let content = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunker.chunk(content, &separator_config(1000, 100));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, content);
    }

    #[test]
    fn test_separator_splits_at_limit_with_overlap() {
        let chunker = SeparatorChunker::new();
        let para = "x".repeat(40);
        let content = [para.as_str(); 4].join("\n\n");
        let chunks = chunker.chunk(&content, &separator_config(100, 45));

        // Two 40-char pieces fit (40 + 2 + 40 = 82); the last piece of each
        // chunk carries over as overlap.
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.char_count() <= 100);
        }
    }

    #[test]
    fn test_separator_keeps_oversized_piece_whole() {
        let chunker = SeparatorChunker::new();
        let long = "y".repeat(150);
        let content = format!("short\n\n{long}\n\nshort again");
        let chunks = chunker.chunk(&content, &separator_config(100, 10));

        assert!(chunks.iter().any(|c| c.content == long));
        for chunk in chunks.iter().filter(|c| c.content != long) {
            assert!(chunk.char_count() <= 100);
        }
    }

    #[test]
    fn test_separator_byte_ranges_valid() {
        let chunker = SeparatorChunker::new();
        let content = "First paragraph.\n\nSecond paragraph.";
        let chunks = chunker.chunk(content, &separator_config(20, 5));

        for chunk in &chunks {
            let (start, end) = chunk.byte_range;
            assert!(start <= end);
            assert!(end <= content.len());
        }
    }

    #[test]
    fn test_separator_range_matches_trimmed_content() {
        let chunker = SeparatorChunker::new();
        let content = "  Leading spaces.\n\nMiddle paragraph.\n\nTrailing spaces.   \n";
        let chunks = chunker.chunk(content, &separator_config(1000, 100));

        assert_eq!(chunks.len(), 1);
        let (start, end) = chunks[0].byte_range;
        assert_eq!(&content[start..end], chunks[0].content);
        assert!(chunks[0].content.starts_with("Leading"));
        assert!(chunks[0].content.ends_with("spaces."));

        let split = chunker.chunk(content, &separator_config(20, 0));
        assert!(split.len() > 1);
        for chunk in &split {
            let (start, end) = chunk.byte_range;
            assert_eq!(&content[start..end], chunk.content);
        }
    }

    #[test]
    fn test_chunker_for_strategy() {
        let content = "a".repeat(30);
        let fixed = chunker_for(ChunkingStrategy::Fixed).chunk(&content, &fixed_config(10, 0));
        assert_eq!(fixed.len(), 3);

        let separated =
            chunker_for(ChunkingStrategy::Separator).chunk(&content, &separator_config(10, 0));
        assert_eq!(separated.len(), 1);
    }
}
