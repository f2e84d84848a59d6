//! Document chunking
//!
//! Splits document text into overlapping fixed-size character windows.
//! Offsets are measured in characters (Unicode scalar values), so a chunk
//! never splits a multi-byte character.

use crate::error::{DocQaError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded document, reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Create a document with a generated identifier
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), text)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// BLAKE3 hex digest of the document text
    pub fn content_hash(&self) -> String {
        blake3::hash(self.text.as_bytes()).to_hex().to_string()
    }
}

/// A contiguous slice of document text used as the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the chunk sequence (0-based)
    pub index: usize,
    /// Chunk text
    pub text: String,
    /// Start character offset in the source document (inclusive)
    pub start: usize,
    /// End character offset in the source document (exclusive)
    pub end: usize,
}

impl Chunk {
    /// Number of characters in the chunk
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }

    /// Short preview of the text, cut on a character boundary
    pub fn preview(&self, max_chars: usize) -> String {
        if self.char_len() <= max_chars {
            self.text.clone()
        } else {
            let cut: String = self.text.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }
}

/// Check chunking parameters without splitting anything
pub fn validate_params(size: usize, overlap: usize) -> Result<()> {
    if size == 0 {
        return Err(DocQaError::invalid_config(
            "chunking.size",
            "Chunk size must be greater than 0",
        ));
    }
    if overlap >= size {
        return Err(DocQaError::invalid_config(
            "chunking.overlap",
            format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            ),
        ));
    }
    Ok(())
}

/// Split `text` into windows of `size` characters advancing by `size - overlap`.
///
/// The first window starts at offset 0 and splitting stops at the first
/// window that reaches the end of the text, so the last chunk may be shorter
/// than `size` but never lies entirely inside the previous chunk.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    validate_params(size, overlap)?;

    // Byte offset of every char boundary, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let step = size - overlap;
    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;

    while start < char_count {
        let end = (start + size).min(char_count);
        chunks.push(Chunk {
            index: chunks.len(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start,
            end,
        });

        if end == char_count {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
