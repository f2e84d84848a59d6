/// Embedding & Indexing
///
/// Local embedding generation and nearest-neighbor search over chunk vectors.
/// Architecture:
/// - EmbeddingProvider trait for abstraction
/// - FastEmbedProvider for local embedding (all-MiniLM-L6-v2, 384-dim)
/// - HashingProvider for model-free offline embedding
/// - VectorIndex trait with exact and HNSW strategies
mod hashing;
mod hnsw;
mod provider;
mod vector_index;

pub use hashing::HashingProvider;
pub use hnsw::{HnswIndex, HnswParams};
pub use provider::{model_dimension, EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{
    squared_l2, ExactIndex, IndexStrategy, Neighbor, VectorIndex, VectorIndexError,
};

/// Build an index over `vectors` with the requested strategy
pub fn build_index(
    strategy: IndexStrategy,
    vectors: Vec<Vec<f32>>,
    params: &HnswParams,
) -> Result<Box<dyn VectorIndex>, VectorIndexError> {
    match strategy {
        IndexStrategy::Exact => Ok(Box::new(ExactIndex::build(vectors)?)),
        IndexStrategy::Hnsw => Ok(Box::new(HnswIndex::build(vectors, params)?)),
    }
}
