//! Retrieval of the chunks nearest to a question

mod retriever;

pub use retriever::Retriever;

use crate::chunking::Chunk;
use serde::{Deserialize, Serialize};

/// A retrieved chunk with its distance to the question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    /// Squared Euclidean distance (smaller is more similar)
    pub distance: f32,
}

impl RetrievalResult {
    /// Display similarity in (0, 1], derived as `1 / (1 + distance)`
    pub fn similarity(&self) -> f32 {
        1.0 / (1.0 + self.distance.max(0.0))
    }

    /// Similarity as a percentage with one decimal
    pub fn confidence(&self) -> String {
        format!("{:.1}%", self.similarity() * 100.0)
    }
}
