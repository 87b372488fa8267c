//! Sentence-packing text chunker.
//!
//! Text is normalised (newlines become spaces), split into sentences on the
//! literal delimiter `". "`, and sentences are packed greedily into windows of
//! at most `chunk_size` characters. When a window closes, the next one starts
//! with the last `chunk_overlap` characters of the closed window so adjacent
//! chunks share context.
//!
//! The splitter is naive: abbreviations such as `"Dr. Smith"` and
//! decimals followed by a space are treated as sentence boundaries, and a
//! sentence longer than `chunk_size` is kept whole rather than cut mid-sentence.
//! Sizes are measured in characters, not bytes.

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting a document's text into chunks.
pub trait Chunker: Send + Sync {
    /// Split `text` from `source` into ordered chunks.
    ///
    /// Returns an empty `Vec` for blank text. Chunk indices start at zero and
    /// follow source order.
    fn chunk(&self, source: &str, text: &str) -> Vec<Chunk>;
}

/// Packs whole sentences into overlapping, size-bounded windows.
///
/// # Example
///
/// ```rust
/// use ragdoc_rag::chunking::{Chunker, SentenceChunker};
///
/// let chunker = SentenceChunker::new(5, 2).unwrap();
/// let chunks = chunker.chunk("notes.txt", "A. B. C.");
/// assert_eq!(chunks[0].text, "A. B.");
/// assert_eq!(chunks[1].text, "B. C.");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    /// Create a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters carried over from one chunk into the next.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into chunk strings.
    pub fn split(&self, text: &str) -> Vec<String> {
        pack_sentences(text, self.chunk_size, self.chunk_overlap)
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, source: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { source: source.to_string(), index, text })
            .collect()
    }
}

/// Split text into overlapping chunks of at most `chunk_size` characters.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`; no
/// text is processed in that case.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    validate(chunk_size, chunk_overlap)?;
    Ok(pack_sentences(text, chunk_size, chunk_overlap))
}

fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_overlap >= chunk_size {
        return Err(RagError::ConfigError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Split normalised text into sentences, each ending with a period.
fn sentences(text: &str) -> Vec<String> {
    // Newlines are collapsed before splitting, so a sentence may span lines.
    let normalized = text.replace('\n', " ");
    normalized
        .split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if s.ends_with('.') { s.to_string() } else { format!("{s}.") })
        .collect()
}

fn pack_sentences(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences(text) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len > chunk_size && !current.is_empty() {
            chunks.push(current.trim().to_string());

            let carried = tail_chars(&current, current_len, chunk_overlap);
            let carried_len = carried.chars().count();
            current = format!("{carried} {sentence}");
            current_len = carried_len + 1 + sentence_len;
        } else {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + sentence_len;
        }
    }

    let last = current.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }

    chunks
}

/// The last `count` characters of `text`, or all of it when shorter.
fn tail_chars(text: &str, text_len: usize, count: usize) -> &str {
    if text_len <= count {
        return text;
    }
    let skip = text_len - count;
    match text.char_indices().nth(skip) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}
