/// Feature-hashing embedding provider
///
/// Maps each lowercase alphanumeric token to a signed bucket chosen by its
/// BLAKE3 hash, then L2-normalizes. Needs no model download, so it backs
/// offline runs and tests. Similarity is lexical, not semantic.
use super::provider::{EmbeddingError, EmbeddingProvider};

pub struct HashingProvider {
    dimension: usize,
    model_name: String,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InitializationError(
                "Hashing dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("hashing-{}", dimension),
        })
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in Self::tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let mut word = [0u8; 8];
            word.copy_from_slice(&hash.as_bytes()[..8]);
            let h = u64::from_le_bytes(word);

            let bucket = (h % self.dimension as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl EmbeddingProvider for HashingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
