use crate::embedding::{EmbeddingError, VectorIndexError};
use crate::generation::GenerationError;
use crate::pipeline::DocumentState;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for docqa
#[derive(Error, Debug)]
pub enum DocQaError {
    /// Chunking, retrieval or configuration values rejected before processing
    #[error("Invalid configuration: {}", format_validation_errors(.errors))]
    InvalidConfiguration { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Document had no text and empty documents are rejected
    #[error("Document {id} contains no extractable text")]
    EmptyDocument { id: String },

    /// Encoder or generator could not be initialized or was released
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Encoder output and index disagree on vector length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Index build attempted with no vectors
    #[error("Cannot build an index from an empty vector list")]
    EmptyIndex,

    /// Generator call failed or timed out
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Persisted index was built with a different configuration
    #[error("Incompatible index: {0}")]
    IncompatibleIndex(String),

    /// Caller supplied unusable input (e.g. an empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document processing stopped at a stage
    #[error("Document processing failed after reaching {stage}: {source}")]
    Processing {
        stage: DocumentState,
        #[source]
        source: Box<DocQaError>,
    },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used by callers to tell user-facing conditions
/// apart from operational failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfiguration,
    EmptyDocument,
    ModelUnavailable,
    DimensionMismatch,
    EmptyIndex,
    GenerationFailed,
    IncompatibleIndex,
    InvalidInput,
    Io,
    Storage,
    Other,
}

impl DocQaError {
    /// Single-field configuration error
    pub fn invalid_config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            errors: vec![ValidationError::new(path, message)],
        }
    }

    /// Classify the error, looking through processing-stage wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration { .. } | Self::ConfigNotFound { .. } => {
                ErrorKind::InvalidConfiguration
            }
            Self::EmptyDocument { .. } => ErrorKind::EmptyDocument,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::EmptyIndex => ErrorKind::EmptyIndex,
            Self::GenerationFailed(_) => ErrorKind::GenerationFailed,
            Self::IncompatibleIndex(_) => ErrorKind::IncompatibleIndex,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Processing { source, .. } => source.kind(),
            Self::Io { .. } => ErrorKind::Io,
            Self::Toml(_) | Self::TomlSerialization(_) => ErrorKind::InvalidConfiguration,
            Self::Json { .. } | Self::Database(_) | Self::Pool(_) => ErrorKind::Storage,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// True for system failures that should be logged, false for problems
    /// the caller can fix by changing its input.
    pub fn is_operational(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::InvalidConfiguration
                | ErrorKind::EmptyDocument
                | ErrorKind::InvalidInput
                | ErrorKind::IncompatibleIndex
        )
    }
}

impl From<EmbeddingError> for DocQaError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InitializationError(msg) => Self::ModelUnavailable(msg),
            EmbeddingError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            EmbeddingError::InvalidInput(msg) => Self::InvalidInput(msg),
            EmbeddingError::GenerationError(msg) => {
                Self::Other(anyhow::anyhow!("embedding failed: {}", msg))
            }
        }
    }
}

impl From<VectorIndexError> for DocQaError {
    fn from(err: VectorIndexError) -> Self {
        match err {
            VectorIndexError::EmptyIndex => Self::EmptyIndex,
            VectorIndexError::InvalidDimension { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            VectorIndexError::InvalidParameter(msg) => {
                Self::invalid_config("indexing", msg)
            }
        }
    }
}

/// `Unavailable` only comes from building a generator. Any failure during a
/// call, including a lost connection, is `GenerationFailed`.
impl From<GenerationError> for DocQaError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Unavailable(msg) => Self::ModelUnavailable(msg),
            other => Self::GenerationFailed(other.to_string()),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for docqa operations
pub type Result<T> = std::result::Result<T, DocQaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_kind_looks_through_stage() {
        let err = DocQaError::Processing {
            stage: DocumentState::Chunked,
            source: Box::new(DocQaError::ModelUnavailable("no model".to_string())),
        };
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert!(err.is_operational());
    }

    #[test]
    fn test_user_errors_are_not_operational() {
        let err = DocQaError::invalid_config("chunking.overlap", "must be smaller than size");
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(!err.is_operational());
        assert!(err.to_string().contains("chunking.overlap"));
    }

    #[test]
    fn test_embedding_error_mapping() {
        let err: DocQaError = EmbeddingError::InitializationError("download failed".into()).into();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);

        let err: DocQaError = EmbeddingError::DimensionMismatch {
            expected: 384,
            actual: 768,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_generation_error_mapping() {
        let err: DocQaError = GenerationError::Unavailable("no HTTP client".into()).into();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);

        let err: DocQaError = GenerationError::Unreachable("connection refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
        assert!(err.is_operational());
    }
}
