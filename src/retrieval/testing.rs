//! Offline embedding provider for unit tests

use crate::embedding::{EmbeddingError, EmbeddingProvider};

/// Maps each known word to one axis; unknown words are ignored
pub(crate) struct VocabProvider {
    vocab: Vec<&'static str>,
}

impl VocabProvider {
    pub(crate) fn new() -> Self {
        Self {
            vocab: vec!["force", "mass", "slope", "line", "cell", "energy"],
        }
    }
}

impl EmbeddingProvider for VocabProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }
        let lowered = text.to_lowercase();
        Ok(self
            .vocab
            .iter()
            .map(|word| lowered.matches(word).count() as f32)
            .collect())
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.vocab.len()
    }

    fn model_name(&self) -> &str {
        "vocab-test"
    }
}
