/// Embedding provider trait and FastEmbed implementation
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Unsupported model: {model}. Supported: {supported}")]
    UnsupportedModel { model: String, supported: String },

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for embedding providers
///
/// Allows abstraction over different embedding backends, and lets tests
/// plug in deterministic encoders.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embeddings for multiple texts, one per input in order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// (name, model, dimension, approximate download size in MB)
static SUPPORTED_MODELS: [(&str, EmbeddingModel, usize, usize); 4] = [
    ("all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2, 384, 90),
    ("all-MiniLM-L12-v2", EmbeddingModel::AllMiniLML12V2, 384, 130),
    ("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384, 130),
    ("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768, 440),
];

/// Options for loading a FastEmbed model
#[derive(Debug, Clone, Default)]
pub struct FastEmbedOptions {
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

/// FastEmbed provider for local embedding generation
///
/// Models are downloaded on first use into the cache directory, then run
/// fully offline.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Names accepted by [`FastEmbedProvider::new`]
    pub fn supported_models() -> Vec<&'static str> {
        SUPPORTED_MODELS.iter().map(|(name, ..)| *name).collect()
    }

    /// True if `model_name` maps to a known model (case-insensitive)
    pub fn is_supported(model_name: &str) -> bool {
        Self::lookup(model_name).is_some()
    }

    fn lookup(model_name: &str) -> Option<&'static (&'static str, EmbeddingModel, usize, usize)> {
        SUPPORTED_MODELS
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(model_name))
    }

    /// Create a new FastEmbed provider with the specified model
    pub fn new(model_name: &str, options: FastEmbedOptions) -> Result<Self, EmbeddingError> {
        let (canonical, embedding_model, dimension, model_size_mb) = Self::lookup(model_name)
            .cloned()
            .ok_or_else(|| EmbeddingError::UnsupportedModel {
                model: model_name.to_string(),
                supported: Self::supported_models().join(", "),
            })?;

        tracing::info!(
            "Initializing embedding model: {} ({}D, ~{}MB download if not cached)",
            canonical,
            dimension,
            model_size_mb
        );

        let mut init_options = InitOptions::new(embedding_model)
            .with_show_download_progress(options.show_download_progress);
        if let Some(cache_dir) = options.cache_dir {
            init_options = init_options.with_cache_dir(cache_dir);
        }

        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: canonical.to_string(),
            dimension,
        })
    }

    /// Create provider with default model (all-MiniLM-L6-v2)
    pub fn with_default_model() -> Result<Self, EmbeddingError> {
        Self::new("all-MiniLM-L6-v2", FastEmbedOptions::default())
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), EmbeddingError> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let embedding = self
            .model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))?;

        self.check_dimension(&embedding)?;

        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Dropping empty texts would shift every later row out of alignment
        if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(format!(
                "Empty text at batch position {}",
                pos
            )));
        }

        let embeddings = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::GenerationError(format!(
                "Embedding count mismatch: expected {}, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
