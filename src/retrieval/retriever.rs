//! Question embedding and nearest-chunk lookup

use super::RetrievalResult;
use crate::error::{DocQaError, Result};
use crate::models::ModelContext;
use crate::pipeline::{DocumentIndex, QueryStage};
use tracing::debug;

/// Maps a question to the chunks nearest to it in a document index
pub struct Retriever<'a> {
    models: &'a ModelContext,
    max_distance: Option<f32>,
}

impl<'a> Retriever<'a> {
    pub fn new(models: &'a ModelContext) -> Self {
        Self {
            models,
            max_distance: None,
        }
    }

    /// Drop results farther than `max_distance`
    pub fn with_max_distance(mut self, max_distance: Option<f32>) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Up to `k` chunks ordered by ascending distance.
    ///
    /// An empty index returns an empty list without touching the encoder.
    pub fn retrieve(
        &self,
        question: &str,
        index: &DocumentIndex,
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(DocQaError::invalid_config(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }
        if question.trim().is_empty() {
            return Err(DocQaError::InvalidInput("Question is empty".to_string()));
        }
        if index.is_empty() {
            debug!("Index for {} is empty, nothing to retrieve", index.document_id());
            return Ok(Vec::new());
        }

        let query = self.models.encode_one(question)?;
        debug!("Query {}", QueryStage::QuestionEmbedded);
        if query.len() != index.dimension() {
            return Err(DocQaError::DimensionMismatch {
                expected: index.dimension(),
                actual: query.len(),
            });
        }

        let neighbors = index.vectors().query(&query, k)?;
        let mut results = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            if let Some(limit) = self.max_distance {
                if neighbor.distance > limit {
                    continue;
                }
            }
            let chunk = index.chunk(neighbor.index).ok_or_else(|| {
                DocQaError::Other(anyhow::anyhow!(
                    "index returned unknown chunk {}",
                    neighbor.index
                ))
            })?;
            results.push(RetrievalResult {
                chunk: chunk.clone(),
                distance: neighbor.distance,
            });
        }

        debug!(
            "Retrieved {} chunks (k={}) for question of {} chars",
            results.len(),
            k,
            question.chars().count()
        );
        Ok(results)
    }
}
