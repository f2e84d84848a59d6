/// HNSW vector index for approximate candidate search
///
/// The graph proposes up to `ef_search` candidates; each is re-scored with the
/// exact squared distance and ranked like `ExactIndex` before truncating to `k`.
/// Results can still differ from `ExactIndex` when the graph misses a neighbor.
use super::vector_index::{
    check_query, common_dimension, rank, squared_l2, IndexStrategy, Neighbor, VectorIndex,
    VectorIndexError,
};
use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};

/// hnsw_rs caps the layer count at 16
const MAX_LAYERS: usize = 16;

/// HNSW construction and search parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Connections per node per layer
    pub m: usize,
    /// Candidate list size during construction (higher = better recall, slower build)
    pub ef_construction: usize,
    /// Candidate list size during search (raised to `k` when smaller)
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}

pub struct HnswIndex {
    graph: Hnsw<'static, f32, DistL2>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    params: HnswParams,
}

impl HnswIndex {
    /// Build the graph from an ordered, non-empty list of equal-length vectors
    pub fn build(vectors: Vec<Vec<f32>>, params: &HnswParams) -> Result<Self, VectorIndexError> {
        if params.m == 0 || params.ef_construction == 0 || params.ef_search == 0 {
            return Err(VectorIndexError::InvalidParameter(
                "HNSW m, ef_construction and ef_search must be greater than 0".to_string(),
            ));
        }
        let dimension = common_dimension(&vectors)?;

        let graph = Hnsw::<f32, DistL2>::new(
            params.m,
            vectors.len(),
            MAX_LAYERS,
            params.ef_construction,
            DistL2 {},
        );
        for (id, vector) in vectors.iter().enumerate() {
            graph.insert((vector.as_slice(), id));
        }

        tracing::debug!(
            "Built HNSW index: {} vectors, {}D, m={}",
            vectors.len(),
            dimension,
            params.m
        );

        Ok(Self {
            graph,
            vectors,
            dimension,
            params: *params,
        })
    }

    pub fn params(&self) -> &HnswParams {
        &self.params
    }
}

impl VectorIndex for HnswIndex {
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorIndexError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        check_query(self.dimension, vector)?;

        // Ask for the whole candidate list so equal-distance ties can resolve
        // to the lowest index after exact re-ranking
        let ef_search = self.params.ef_search.max(k);
        let pool = ef_search.min(self.vectors.len());
        let candidates = self
            .graph
            .search(vector, pool, ef_search)
            .into_iter()
            .filter_map(|n| {
                self.vectors.get(n.d_id).map(|stored| Neighbor {
                    index: n.d_id,
                    distance: squared_l2(stored, vector),
                })
            })
            .collect();

        Ok(rank(candidates, k))
    }

    fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Hnsw
    }
}
