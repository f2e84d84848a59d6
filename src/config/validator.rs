use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{DocQaError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_chunking(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_indexing(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_storage(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocQaError::InvalidConfiguration { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        let chunking = &config.chunking;
        if chunking.size == 0 {
            errors.push(ValidationError::new(
                "chunking.size",
                "Chunk size must be greater than 0",
            ));
        } else if chunking.overlap >= chunking.size {
            errors.push(ValidationError::new(
                "chunking.overlap",
                format!(
                    "Chunk overlap ({}) must be smaller than chunk size ({})",
                    chunking.overlap, chunking.size
                ),
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let provider = &config.embedding.provider;
        if provider != "fastembed" && provider != "hashing" {
            errors.push(ValidationError::new(
                "embedding.provider",
                format!("Provider must be 'fastembed' or 'hashing', got '{}'", provider),
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Embedding dimension must be greater than 0",
            ));
        }
    }

    fn validate_indexing(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.indexing.hnsw_ef_construction == 0 {
            errors.push(ValidationError::new(
                "indexing.hnsw_ef_construction",
                "HNSW ef_construction must be greater than 0",
            ));
        }

        if config.indexing.hnsw_ef_search == 0 {
            errors.push(ValidationError::new(
                "indexing.hnsw_ef_search",
                "HNSW ef_search must be greater than 0",
            ));
        }

        if config.indexing.hnsw_m == 0 {
            errors.push(ValidationError::new(
                "indexing.hnsw_m",
                "HNSW M must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;
        if retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        // A budget below one full chunk would drop every full-size chunk
        if retrieval.max_context_chars < config.chunking.size {
            errors.push(ValidationError::new(
                "retrieval.max_context_chars",
                format!(
                    "max_context_chars ({}) must be at least chunking.size ({})",
                    retrieval.max_context_chars, config.chunking.size
                ),
            ));
        }

        if let Some(d) = retrieval.max_distance {
            if !d.is_finite() || d < 0.0 {
                errors.push(ValidationError::new(
                    "retrieval.max_distance",
                    format!("max_distance must be a non-negative number, got {}", d),
                ));
            }
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        // Remaining settings only matter when the generator is loaded
        if !config.llm.enabled {
            return;
        }

        let provider = &config.llm.provider;
        if provider != "ollama" {
            errors.push(ValidationError::new(
                "llm.provider",
                format!("Provider must be 'ollama', got '{}'", provider),
            ));
        }

        let endpoint = &config.llm.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ValidationError::new(
                "llm.endpoint",
                format!("Endpoint must be an http(s) URL, got '{}'", endpoint),
            ));
        }

        if config.llm.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }

        if config.llm.max_tokens == 0 {
            errors.push(ValidationError::new(
                "llm.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }
    }
}
