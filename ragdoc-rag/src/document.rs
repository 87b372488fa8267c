//! Data types for chunks, indexed records, and query results.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A contiguous window of a document's extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Name of the source document.
    pub source: String,
    /// Position of this chunk within its source, starting at zero.
    pub index: usize,
    /// The chunk text.
    pub text: String,
}

impl Chunk {
    /// The stable record identifier, `{source}_chunk_{index}`.
    ///
    /// Re-ingesting the same source overwrites the records with these ids.
    pub fn id(&self) -> String {
        record_id(&self.source, self.index)
    }

    /// The metadata stored alongside this chunk's vector.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata { text: self.text.clone(), source: self.source.clone(), chunk_id: self.index }
    }
}

/// Build the record identifier for a chunk of `source` at `index`.
pub fn record_id(source: &str, index: usize) -> String {
    format!("{source}_chunk_{index}")
}

/// Payload metadata stored with every vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// The chunk text.
    pub text: String,
    /// Name of the source document.
    pub source: String,
    /// Position of the chunk within its source.
    ///
    /// Hosted indexes may hand numeric metadata back as floats (`3.0`).
    #[serde(deserialize_with = "deserialize_position")]
    pub chunk_id: usize,
}

fn deserialize_position<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(D::Error::custom(format!(
            "chunk_id must be a non-negative integer, got {value}"
        )));
    }
    Ok(value as usize)
}

/// A stored `(id, vector, metadata)` triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedRecord {
    /// Unique record identifier.
    pub id: String,
    /// The embedding vector.
    pub values: Vec<f32>,
    /// Chunk metadata.
    pub metadata: ChunkMetadata,
}

impl IndexedRecord {
    /// Pair a chunk with its embedding.
    pub fn from_chunk(chunk: &Chunk, values: Vec<f32>) -> Self {
        Self { id: chunk.id(), values, metadata: chunk.metadata() }
    }
}

/// One retrieved record with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryMatch {
    /// Record identifier.
    pub id: String,
    /// Similarity score (higher is more relevant).
    pub score: f32,
    /// The stored metadata.
    pub metadata: ChunkMetadata,
}

impl QueryMatch {
    /// The first `max_chars` characters of the matched text, with `...` appended
    /// when the text was cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let text = &self.metadata.text;
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.clone(),
        }
    }
}

/// Matches ordered by descending score, at most `top_k` long.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// The matches, most relevant first.
    pub matches: Vec<QueryMatch>,
}

impl QueryResult {
    /// A result with no matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result, sorting by descending score and truncating to `top_k`.
    pub fn ranked(mut matches: Vec<QueryMatch>, top_k: usize) -> Self {
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Self { matches }
    }

    /// Whether no records matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

/// Aggregate statistics about an index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of vectors stored in the index.
    pub total_vector_count: u64,
    /// Vector dimension, when the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(text: &str, score: f32) -> QueryMatch {
        QueryMatch {
            id: "doc.txt_chunk_0".into(),
            score,
            metadata: ChunkMetadata { text: text.into(), source: "doc.txt".into(), chunk_id: 0 },
        }
    }

    #[test]
    fn chunk_id_follows_source_and_index() {
        let chunk = Chunk { source: "report.pdf".into(), index: 7, text: "x".into() };
        assert_eq!(chunk.id(), "report.pdf_chunk_7");
        assert_eq!(chunk.metadata().chunk_id, 7);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let m = sample_match("héllo wörld", 0.5);
        assert_eq!(m.preview(5), "héllo...");
        assert_eq!(m.preview(100), "héllo wörld");
    }

    #[test]
    fn ranked_orders_descending_and_truncates() {
        let result = QueryResult::ranked(
            vec![sample_match("a", 0.1), sample_match("b", 0.9), sample_match("c", 0.5)],
            2,
        );
        let scores: Vec<f32> = result.matches.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
    }

    #[test]
    fn chunk_id_accepts_float_encoding() {
        let metadata: ChunkMetadata =
            serde_json::from_str(r#"{"text":"t","source":"s","chunk_id":3.0}"#).unwrap();
        assert_eq!(metadata.chunk_id, 3);
        assert!(
            serde_json::from_str::<ChunkMetadata>(r#"{"text":"t","source":"s","chunk_id":1.5}"#)
                .is_err()
        );
    }

    #[test]
    fn metadata_serializes_with_chunk_id_key() {
        let json = serde_json::to_value(sample_match("t", 0.2).metadata).unwrap();
        assert_eq!(json["chunk_id"], 0);
        assert_eq!(json["source"], "doc.txt");
    }
}
