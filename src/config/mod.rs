//! Configuration management for docqa
//!
//! Loads the TOML configuration, applies profile and environment overrides,
//! and validates the result before anything is built from it.

use crate::embedding::{HnswParams, IndexStrategy};
use crate::error::{DocQaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta", default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: current_timestamp(),
            last_modified: current_timestamp(),
        }
    }
}

/// Document splitting, in characters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 50,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "fastembed" or "hashing"
    pub provider: String,
    pub model: String,
    /// Only used by the hashing provider; fastembed models fix their own
    pub dimension: usize,
    pub batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "fastembed".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            batch_size: 32,
            cache_dir: None,
        }
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub strategy: IndexStrategy,
    pub hnsw_m: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_ef_search: usize,
    /// Fail on documents without text instead of indexing them empty
    #[serde(default)]
    pub reject_empty: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        let hnsw = HnswParams::default();
        Self {
            strategy: IndexStrategy::Exact,
            hnsw_m: hnsw.m,
            hnsw_ef_construction: hnsw.ef_construction,
            hnsw_ef_search: hnsw.ef_search,
            reject_empty: false,
        }
    }
}

impl IndexingConfig {
    pub fn hnsw_params(&self) -> HnswParams {
        HnswParams {
            m: self.hnsw_m,
            ef_construction: self.hnsw_ef_construction,
            ef_search: self.hnsw_ef_search,
        }
    }
}

/// Retrieval and context assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub max_context_chars: usize,
    /// Discard chunks farther than this squared L2 distance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_context_chars: 2000,
            max_distance: None,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen2.5:0.5b".to_string(),
            temperature: 0.0,
            max_tokens: 512,
            timeout_secs: 120,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where `index` writes when no output path is given
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: Config::default_data_dir().unwrap_or_else(|_| PathBuf::from(".docqa")),
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<IndexStrategy>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocQaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocQaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load `path` if given, else the default path if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Self::default_path()?;
        if default_path.exists() {
            return Self::load(&default_path);
        }

        tracing::debug!("No config at {:?}; using defaults", default_path);
        let mut config = Self::default();
        config.apply_env_overrides()?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocQaError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| DocQaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self.profiles.get(profile).cloned().ok_or_else(|| {
            DocQaError::invalid_config("profiles", format!("Unknown profile '{}'", profile))
        })?;

        if let Some(provider) = overrides.embedding_provider {
            self.embedding.provider = provider;
        }
        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        if let Some(enabled) = overrides.llm_enabled {
            self.llm.enabled = enabled;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(top_k) = overrides.top_k {
            self.retrieval.top_k = top_k;
        }
        if let Some(strategy) = overrides.strategy {
            self.indexing.strategy = strategy;
        }
        tracing::debug!("Applied profile '{}'", profile);
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: DOCQA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(std::env::vars())
    }

    /// Apply `DOCQA_`-prefixed overrides from any key/value source
    pub fn apply_overrides_from<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut errors = Vec::new();
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("DOCQA_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    match e {
                        DocQaError::InvalidConfiguration { errors: mut errs } => {
                            errors.append(&mut errs)
                        }
                        other => return Err(other),
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocQaError::InvalidConfiguration { errors })
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "CHUNKING__SIZE" => self.chunking.size = parse_env(path, value)?,
            "CHUNKING__OVERLAP" => self.chunking.overlap = parse_env(path, value)?,
            "EMBEDDING__PROVIDER" => self.embedding.provider = value.to_string(),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__DIMENSION" => self.embedding.dimension = parse_env(path, value)?,
            "EMBEDDING__CACHE_DIR" => self.embedding.cache_dir = Some(PathBuf::from(value)),
            "INDEXING__STRATEGY" => self.indexing.strategy = parse_env(path, value)?,
            "INDEXING__REJECT_EMPTY" => self.indexing.reject_empty = parse_env(path, value)?,
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_env(path, value)?,
            "RETRIEVAL__MAX_CONTEXT_CHARS" => {
                self.retrieval.max_context_chars = parse_env(path, value)?
            }
            "RETRIEVAL__MAX_DISTANCE" => {
                self.retrieval.max_distance = Some(parse_env(path, value)?)
            }
            "LLM__ENABLED" => self.llm.enabled = parse_env(path, value)?,
            "LLM__ENDPOINT" => self.llm.endpoint = value.to_string(),
            "LLM__MODEL" => self.llm.model = value.to_string(),
            "LLM__TIMEOUT_SECS" => self.llm.timeout_secs = parse_env(path, value)?,
            "STORAGE__DATA_DIR" => self.storage.data_dir = PathBuf::from(value),
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DocQaError::invalid_config("config", "Cannot determine config directory")
        })?;

        Ok(config_dir.join("docqa").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| DocQaError::invalid_config("storage.data_dir", "Cannot determine data directory"))?;

        Ok(data_dir.join("docqa"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        DocQaError::invalid_config(
            path.to_lowercase().replace("__", "."),
            format!("Cannot parse '{}'", value),
        )
    })
}
