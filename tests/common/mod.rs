//! Deterministic test models shared by the integration tests

#![allow(dead_code)]

use docqa::embedding::{EmbeddingError, EmbeddingProvider};
use docqa::generation::{AnswerGenerator, GenerationError};
use docqa::models::ModelContext;
use docqa::pipeline::{PipelineSettings, QaPipeline};
use std::sync::{Arc, Mutex};

pub const SAMPLE: &str = "Alice is a Python engineer. Bob is a Java engineer.";

/// One dimension per known word; unknown words are ignored
pub struct VocabularyEncoder {
    vocabulary: Vec<&'static str>,
}

impl VocabularyEncoder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
        }
    }

    pub fn people() -> Self {
        Self::new(&["alice", "python", "bob", "java"])
    }
}

impl EmbeddingProvider for VocabularyEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
        {
            if let Some(pos) = self.vocabulary.iter().position(|v| *v == word) {
                vector[pos] += 1.0;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn model_name(&self) -> &str {
        "vocabulary"
    }
}

/// Records every prompt and answers with a fixed reply, or fails every call
#[derive(Clone, Default)]
pub struct RecordingGenerator {
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub reply: String,
    pub fail: bool,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            prompts: Arc::default(),
            reply: reply.to_string(),
            fail: false,
        }
    }

    /// Behaves like a server that drops the connection
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl AnswerGenerator for RecordingGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(GenerationError::Unreachable("connection refused".to_string()));
        }
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

pub fn pipeline_with(
    encoder: VocabularyEncoder,
    generator: &RecordingGenerator,
    settings: PipelineSettings,
) -> QaPipeline {
    let models = ModelContext::new(Box::new(encoder), Some(Box::new(generator.clone())));
    QaPipeline::new(Arc::new(models), settings)
}
