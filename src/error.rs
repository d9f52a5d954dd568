use crate::embedding::{EmbeddingError, VectorIndexError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for studyrag
///
/// Only index construction and configuration can fail. Query-time calls
/// always return a (possibly empty) ranked list instead.
#[derive(Error, Debug)]
pub enum StudyragError {
    /// A retriever was asked to index an empty chunk collection
    #[error("Cannot build an index over an empty corpus")]
    EmptyCorpus,

    /// The configured embedding model is not known
    #[error("Unsupported embedding model: {model}. Supported: {supported}")]
    InvalidEmbeddingModel { model: String, supported: String },

    /// Embedding failures while building an index
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index construction or snapshot errors
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

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
}

impl StudyragError {
    /// True for errors caused by the corpus being empty rather than by setup
    pub fn is_empty_corpus(&self) -> bool {
        matches!(self, StudyragError::EmptyCorpus)
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
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

/// Result type for studyrag operations
pub type Result<T> = std::result::Result<T, StudyragError>;
