/// Vector index abstraction and exact nearest-neighbor search
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Cannot build an index from an empty vector list")]
    EmptyIndex,

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid index parameter: {0}")]
    InvalidParameter(String),
}

/// A stored vector matched by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Chunk sequence index
    pub index: usize,
    /// Squared Euclidean distance to the query (smaller is closer)
    pub distance: f32,
}

/// Nearest-neighbor search strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    /// Full scan, exact results
    #[default]
    Exact,
    /// HNSW graph candidates, re-scored exactly
    Hnsw,
}

impl IndexStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Hnsw => "hnsw",
        }
    }
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "hnsw" => Ok(Self::Hnsw),
            other => Err(format!("Unknown index strategy '{}'", other)),
        }
    }
}

/// Read-only nearest-neighbor index over chunk vectors.
///
/// Position in the stored vector list is the chunk sequence index.
pub trait VectorIndex: Send + Sync {
    /// Up to `k` neighbors sorted by ascending squared distance, ties broken
    /// by lower sequence index. An empty index yields an empty list.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorIndexError>;

    /// Stored vectors in sequence order
    fn vectors(&self) -> &[Vec<f32>];

    /// Vector dimension
    fn dimension(&self) -> usize;

    fn strategy(&self) -> IndexStrategy;

    fn len(&self) -> usize {
        self.vectors().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Squared Euclidean distance
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Check a non-empty vector list for a shared dimension and return it
pub(crate) fn common_dimension(vectors: &[Vec<f32>]) -> Result<usize, VectorIndexError> {
    let first = vectors.first().ok_or(VectorIndexError::EmptyIndex)?;
    let dimension = first.len();
    if dimension == 0 {
        return Err(VectorIndexError::InvalidParameter(
            "Vectors must have at least one component".to_string(),
        ));
    }

    match vectors.iter().find(|v| v.len() != dimension) {
        Some(bad) => Err(VectorIndexError::InvalidDimension {
            expected: dimension,
            actual: bad.len(),
        }),
        None => Ok(dimension),
    }
}

pub(crate) fn check_query(dimension: usize, vector: &[f32]) -> Result<(), VectorIndexError> {
    if vector.len() != dimension {
        return Err(VectorIndexError::InvalidDimension {
            expected: dimension,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Sort by (distance, index) and keep the first `k`
pub(crate) fn rank(mut neighbors: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    neighbors.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.index.cmp(&b.index))
    });
    neighbors.truncate(k);
    neighbors
}

/// Exact index: distance to every stored vector on each query
#[derive(Debug, Clone)]
pub struct ExactIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl ExactIndex {
    /// Build from an ordered, non-empty list of equal-length vectors
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, VectorIndexError> {
        let dimension = common_dimension(&vectors)?;
        Ok(Self { dimension, vectors })
    }

    /// Index holding no vectors; every query returns nothing
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Append a vector, returning its sequence index
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<usize, VectorIndexError> {
        check_query(self.dimension, &vector)?;
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }
}

impl VectorIndex for ExactIndex {
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorIndexError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        check_query(self.dimension, vector)?;

        let scored = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, stored)| Neighbor {
                index,
                distance: squared_l2(stored, vector),
            })
            .collect();

        Ok(rank(scored, k))
    }

    fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_build_rejects_empty() {
        assert!(matches!(
            ExactIndex::build(Vec::new()),
            Err(VectorIndexError::EmptyIndex)
        ));
    }

    #[test]
    fn test_build_rejects_mixed_dimensions() {
        let result = ExactIndex::build(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        assert!(matches!(
            result,
            Err(VectorIndexError::InvalidDimension {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_self_retrieval_at_zero_distance() {
        let vectors: Vec<Vec<f32>> = (0..8).map(|i| unit(8, i)).collect();
        let index = ExactIndex::build(vectors.clone()).unwrap();

        for (i, v) in vectors.iter().enumerate() {
            let hits = index.query(v, 1).unwrap();
            assert_eq!(hits[0].index, i);
            assert!(hits[0].distance.abs() < 1e-6);
        }
    }

    #[test]
    fn test_sorted_and_bounded() {
        let index = ExactIndex::build(vec![
            vec![0.0, 0.0],
            vec![3.0, 0.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
        ])
        .unwrap();

        let hits = index.query(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 2, 3]);
        assert_eq!(hits[2].distance, 4.0);

        // k larger than the index returns everything
        assert_eq!(index.query(&[0.0, 0.0], 10).unwrap().len(), 4);
    }

    #[test]
    fn test_ties_break_on_lower_index() {
        let index = ExactIndex::build(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let hits = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 2);
    }

    #[test]
    fn test_empty_index_query() {
        let index = ExactIndex::empty(384);
        assert!(index.is_empty());
        assert!(index.query(&[0.5; 384], 3).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_checked() {
        let index = ExactIndex::build(vec![vec![1.0, 2.0]]).unwrap();
        assert!(index.query(&[1.0], 1).is_err());
    }

    #[test]
    fn test_insert_appends() {
        let mut index = ExactIndex::empty(2);
        assert_eq!(index.insert(vec![1.0, 1.0]).unwrap(), 0);
        assert_eq!(index.insert(vec![2.0, 2.0]).unwrap(), 1);
        assert!(index.insert(vec![1.0]).is_err());
        assert_eq!(index.query(&[2.0, 2.0], 1).unwrap()[0].index, 1);
    }

    #[test]
    fn test_strategy_round_trip_names() {
        assert_eq!("hnsw".parse::<IndexStrategy>().unwrap(), IndexStrategy::Hnsw);
        assert_eq!(IndexStrategy::Exact.to_string(), "exact");
        assert!("flat".parse::<IndexStrategy>().is_err());
    }
}
