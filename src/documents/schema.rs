//! Tantivy schema for chunk storage.
//!
//! One tantivy document per chunk. The embedding is kept as a stored bytes
//! field (little-endian `f32`s) next to the text it was computed from.

use tantivy::schema::{FAST, Field, NumericOptions, STORED, STRING, Schema, SchemaBuilder, TEXT};

/// Schema fields for chunk storage.
#[derive(Debug)]
pub struct DocumentSchema {
    /// Unique identifier for this chunk.
    pub chunk_id: Field,

    /// Source file path.
    pub source_path: Field,

    /// Full chunk content.
    pub content: Field,

    /// Start byte offset in source file.
    pub byte_start: Field,

    /// End byte offset in source file.
    pub byte_end: Field,

    /// Character count for the chunk.
    pub char_count: Field,

    /// Embedding vector as little-endian f32 bytes.
    pub embedding: Field,

    /// Timestamp when indexed (UTC seconds).
    pub indexed_at: Field,
}

impl DocumentSchema {
    /// Build the schema for chunk storage.
    pub fn build() -> (Schema, Self) {
        let mut builder = SchemaBuilder::default();

        let indexed_u64 = NumericOptions::default()
            .set_indexed()
            .set_stored()
            .set_fast();

        let chunk_id = builder.add_u64_field("chunk_id", indexed_u64);
        let source_path = builder.add_text_field("source_path", STRING | STORED);
        let content = builder.add_text_field("content", TEXT | STORED);
        let byte_start = builder.add_u64_field("byte_start", STORED);
        let byte_end = builder.add_u64_field("byte_end", STORED);
        let char_count = builder.add_u64_field("char_count", STORED);
        let embedding = builder.add_bytes_field("embedding", STORED);
        let indexed_at = builder.add_u64_field("indexed_at", STORED | FAST);

        let schema = builder.build();

        let document_schema = Self {
            chunk_id,
            source_path,
            content,
            byte_start,
            byte_end,
            char_count,
            embedding,
            indexed_at,
        };

        (schema, document_schema)
    }

    /// Resolve the fields of an existing index schema.
    pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
        Ok(Self {
            chunk_id: schema.get_field("chunk_id")?,
            source_path: schema.get_field("source_path")?,
            content: schema.get_field("content")?,
            byte_start: schema.get_field("byte_start")?,
            byte_end: schema.get_field("byte_end")?,
            char_count: schema.get_field("char_count")?,
            embedding: schema.get_field("embedding")?,
            indexed_at: schema.get_field("indexed_at")?,
        })
    }
}

/// Encode an embedding as little-endian bytes.
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode little-endian bytes into an embedding.
///
/// Returns `None` when the byte length is not a multiple of four.
pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_build() {
        let (schema, fields) = DocumentSchema::build();

        assert!(schema.get_field("chunk_id").is_ok());
        assert!(schema.get_field("embedding").is_ok());
        assert_eq!(schema.fields().count(), 8);

        let resolved = DocumentSchema::from_schema(&schema).unwrap();
        assert_eq!(resolved.embedding, fields.embedding);
        assert_eq!(resolved.content, fields.content);
    }

    #[test]
    fn test_decode_rejects_truncated_bytes() {
        let mut bytes = encode_embedding(&[0.25, -1.5]);
        assert_eq!(decode_embedding(&bytes), Some(vec![0.25, -1.5]));

        bytes.pop();
        assert!(decode_embedding(&bytes).is_none());
    }
}
