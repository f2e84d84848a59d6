//! Ready-to-query document index

use super::lifecycle::DocumentState;
use crate::chunking::Chunk;
use crate::embedding::{HnswParams, IndexStrategy, VectorIndex};
use crate::error::{DocQaError, Result};
use crate::models::EncoderInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration an index was built with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub encoder_model: String,
    pub dimension: usize,
    pub strategy: IndexStrategy,
    pub hnsw: HnswParams,
}

/// Identity and build configuration of an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub document_id: String,
    /// BLAKE3 hex digest of the source text
    pub content_hash: String,
    pub settings: IndexSettings,
    pub created_at: DateTime<Utc>,
}

/// Chunks of one document and their vectors, read-only once built.
///
/// Only constructed in the `Ready` state, so holding one means the document
/// can be queried.
pub struct DocumentIndex {
    metadata: IndexMetadata,
    chunks: Vec<Chunk>,
    vectors: Box<dyn VectorIndex>,
}

impl DocumentIndex {
    /// Assemble an index, checking that chunks and vectors line up
    pub fn from_parts(
        metadata: IndexMetadata,
        chunks: Vec<Chunk>,
        vectors: Box<dyn VectorIndex>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(DocQaError::Other(anyhow::anyhow!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if vectors.dimension() != metadata.settings.dimension {
            return Err(DocQaError::DimensionMismatch {
                expected: metadata.settings.dimension,
                actual: vectors.dimension(),
            });
        }
        if let Some((pos, _)) = chunks.iter().enumerate().find(|(i, c)| c.index != *i) {
            return Err(DocQaError::Other(anyhow::anyhow!(
                "chunk at position {} has sequence index {}",
                pos,
                chunks[pos].index
            )));
        }

        Ok(Self {
            metadata,
            chunks,
            vectors,
        })
    }

    pub fn state(&self) -> DocumentState {
        DocumentState::Ready
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.metadata.settings
    }

    pub fn document_id(&self) -> &str {
        &self.metadata.document_id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn vectors(&self) -> &dyn VectorIndex {
        self.vectors.as_ref()
    }

    pub fn dimension(&self) -> usize {
        self.metadata.settings.dimension
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Refuse to query with an encoder other than the one that built the index
    pub fn check_compatible(&self, encoder: &EncoderInfo) -> Result<()> {
        let settings = &self.metadata.settings;
        if settings.dimension != encoder.dimension {
            return Err(DocQaError::IncompatibleIndex(format!(
                "index vectors are {}D but encoder {} produces {}D",
                settings.dimension, encoder.model_name, encoder.dimension
            )));
        }
        if settings.encoder_model != encoder.model_name {
            return Err(DocQaError::IncompatibleIndex(format!(
                "index was built with encoder '{}', current encoder is '{}'",
                settings.encoder_model, encoder.model_name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("metadata", &self.metadata)
            .field("chunks", &self.chunks.len())
            .field("strategy", &self.vectors.strategy())
            .finish()
    }
}
