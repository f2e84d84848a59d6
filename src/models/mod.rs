//! Model context
//!
//! Owns the embedding encoder and answer generator handles for the process.
//! Handles are created explicitly with [`ModelContext::init`] (or injected
//! with [`ModelContext::new`]) and dropped with [`ModelContext::release`].
//! Every handle sits behind its own mutex, so concurrent callers take turns
//! on a given model.

use crate::config::{Config, EmbeddingConfig, LlmConfig};
use crate::embedding::{EmbeddingProvider, FastEmbedProvider, HashingProvider};
use crate::error::{DocQaError, Result};
use crate::generation::{AnswerGenerator, OllamaGenerator};
use std::sync::Mutex;

/// Guarded slot for one loaded model
pub struct ModelHandle<T: ?Sized> {
    name: &'static str,
    slot: Mutex<Option<Box<T>>>,
}

impl<T: ?Sized> ModelHandle<T> {
    fn new(name: &'static str, model: Option<Box<T>>) -> Self {
        Self {
            name,
            slot: Mutex::new(model),
        }
    }

    /// Run `f` with exclusive access to the loaded model
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let guard = self
            .slot
            .lock()
            .map_err(|_| DocQaError::ModelUnavailable(format!("{} handle is poisoned", self.name)))?;
        let model = guard
            .as_deref()
            .ok_or_else(|| DocQaError::ModelUnavailable(format!("{} is not loaded", self.name)))?;
        Ok(f(model))
    }

    /// Replace the loaded model
    pub fn install(&self, model: Box<T>) {
        match self.slot.lock() {
            Ok(mut guard) => *guard = Some(model),
            Err(poisoned) => *poisoned.into_inner() = Some(model),
        }
    }

    /// Drop the loaded model; returns whether one was loaded
    pub fn release(&self) -> bool {
        match self.slot.lock() {
            Ok(mut guard) => guard.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

/// Encoder identity recorded on every index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInfo {
    pub model_name: String,
    pub dimension: usize,
}

pub struct ModelContext {
    encoder: ModelHandle<dyn EmbeddingProvider>,
    generator: ModelHandle<dyn AnswerGenerator>,
}

impl ModelContext {
    /// Use already constructed models
    pub fn new(
        encoder: Box<dyn EmbeddingProvider>,
        generator: Option<Box<dyn AnswerGenerator>>,
    ) -> Self {
        Self {
            encoder: ModelHandle::new("embedding encoder", Some(encoder)),
            generator: ModelHandle::new("answer generator", generator),
        }
    }

    /// Load the encoder and, when enabled, the generator described by `config`.
    ///
    /// A failure leaves nothing cached, so calling `init` again retries.
    pub fn init(config: &Config) -> Result<Self> {
        let encoder = load_encoder(&config.embedding)?;
        let generator = if config.llm.enabled {
            Some(load_generator(&config.llm)?)
        } else {
            tracing::info!("Answer generation disabled; retrieval only");
            None
        };
        Ok(Self::new(encoder, generator))
    }

    /// Reload whichever handles are missing, e.g. after `release`
    pub fn reload(&self, config: &Config) -> Result<()> {
        if !self.encoder.is_loaded() {
            self.encoder.install(load_encoder(&config.embedding)?);
        }
        if config.llm.enabled && !self.generator.is_loaded() {
            self.generator.install(load_generator(&config.llm)?);
        }
        Ok(())
    }

    /// Drop both model handles. Later calls fail with `ModelUnavailable`
    /// until `reload`.
    pub fn release(&self) {
        let encoder = self.encoder.release();
        let generator = self.generator.release();
        tracing::info!(
            "Released models (encoder: {}, generator: {})",
            encoder,
            generator
        );
    }

    pub fn encoder(&self) -> &ModelHandle<dyn EmbeddingProvider> {
        &self.encoder
    }

    pub fn generator(&self) -> &ModelHandle<dyn AnswerGenerator> {
        &self.generator
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_loaded()
    }

    pub fn encoder_info(&self) -> Result<EncoderInfo> {
        self.encoder.with(|e| EncoderInfo {
            model_name: e.model_name().to_string(),
            dimension: e.dimension(),
        })
    }

    /// Encode `texts` in order, checking count and dimension of the output
    pub fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (vectors, dimension) = self
            .encoder
            .with(|e| e.embed_batch(texts).map(|v| (v, e.dimension())))??;

        if vectors.len() != texts.len() {
            return Err(DocQaError::Other(anyhow::anyhow!(
                "encoder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(DocQaError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }

    /// Encode a single text
    pub fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(&[text.to_string()])?
            .pop()
            .ok_or_else(|| DocQaError::Other(anyhow::anyhow!("encoder returned no vector")))
    }

    /// Run the generator on `prompt`
    pub fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.generator.with(|g| g.generate(prompt))??)
    }
}

fn load_encoder(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let encoder: Box<dyn EmbeddingProvider> = match config.provider.as_str() {
        "fastembed" => Box::new(FastEmbedProvider::new(
            &config.model,
            config.cache_dir.clone(),
            config.batch_size,
        )?),
        "hashing" => Box::new(HashingProvider::new(config.dimension)?),
        other => {
            return Err(DocQaError::ModelUnavailable(format!(
                "Unknown embedding provider '{}'",
                other
            )))
        }
    };
    Ok(encoder)
}

fn load_generator(config: &LlmConfig) -> Result<Box<dyn AnswerGenerator>> {
    match config.provider.as_str() {
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => Err(DocQaError::ModelUnavailable(format!(
            "Unknown generation provider '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn hashing_context() -> ModelContext {
        ModelContext::new(Box::new(HashingProvider::new(32).unwrap()), None)
    }

    #[test]
    fn test_encode_preserves_order() {
        let models = hashing_context();
        let texts = vec!["alpha".to_string(), "beta".to_string(), "alpha".to_string()];
        let vectors = models.encode(&texts).unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vectors[2]);
        assert_ne!(vectors[0], vectors[1]);
    }

    #[test]
    fn test_release_then_reload() {
        let models = hashing_context();
        assert!(models.encoder().is_loaded());

        models.release();
        let err = models.encode_one("x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);

        let mut config = Config::default();
        config.embedding.provider = "hashing".to_string();
        config.embedding.dimension = 32;
        config.llm.enabled = false;
        models.reload(&config).unwrap();
        assert_eq!(models.encode_one("x").unwrap().len(), 32);
    }

    #[test]
    fn test_missing_generator_is_unavailable() {
        let models = hashing_context();
        assert!(!models.has_generator());
        let err = models.generate("prompt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = Config::default();
        config.embedding.provider = "word2vec".to_string();
        assert!(matches!(
            ModelContext::init(&config),
            Err(DocQaError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_encoder_info() {
        let info = hashing_context().encoder_info().unwrap();
        assert_eq!(info.dimension, 32);
        assert_eq!(info.model_name, "hashing-32");
    }
}
