//! Configuration management for studyrag
//!
//! Settings are read from a TOML file, then overridden from `STUDYRAG_*`
//! environment variables, then validated as a whole.

use crate::error::{Result, StudyragError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Default separator hierarchy: paragraph, line, sentence, word, character window
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Chunking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Token budget per chunk
    pub chunk_size: usize,
    /// Separators tried in order; the last one should be the empty string
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Number of chunk texts encoded per model call
    pub batch_size: usize,
    /// Where downloaded model files are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            batch_size: 32,
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

impl EmbeddingConfig {
    /// Resolved model cache directory
    pub fn resolved_cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("studyrag")
                .join("models"),
        }
    }
}

/// Hybrid retrieval configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of fused results returned
    pub top_k: usize,
    /// Semantic weight in [0, 1]; 0 is pure lexical, 1 is pure semantic
    pub alpha: f32,
    /// Lexical candidates fetched before fusion
    pub lexical_k: usize,
    /// Semantic candidates fetched before fusion
    pub semantic_k: usize,
    /// RRF smoothing constant
    pub rrf_k: f32,
    /// Default minimum BM25 score for thresholded lexical search
    pub lexical_threshold: f32,
    /// Default minimum cosine similarity for thresholded semantic search
    pub semantic_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            alpha: 0.5,
            lexical_k: 20,
            semantic_k: 20,
            rrf_k: 60.0,
            lexical_threshold: 0.0,
            semantic_threshold: 0.5,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StudyragError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| StudyragError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Parse and validate configuration from TOML text, without env overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StudyragError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }
        std::fs::write(path, content).map_err(|e| StudyragError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: STUDYRAG_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("STUDYRAG_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "CHUNKING__CHUNK_SIZE" => self.chunking.chunk_size = parse_value(path, value)?,
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__BATCH_SIZE" => self.embedding.batch_size = parse_value(path, value)?,
            "EMBEDDING__CACHE_DIR" => self.embedding.cache_dir = Some(PathBuf::from(value)),
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_value(path, value)?,
            "RETRIEVAL__ALPHA" => self.retrieval.alpha = parse_value(path, value)?,
            "RETRIEVAL__LEXICAL_K" => self.retrieval.lexical_k = parse_value(path, value)?,
            "RETRIEVAL__SEMANTIC_K" => self.retrieval.semantic_k = parse_value(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            StudyragError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("studyrag").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StudyragError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}
