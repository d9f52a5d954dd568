/// Batched corpus encoding for index construction
use super::{EmbeddingError, EmbeddingProvider};
use std::time::Instant;
use tracing::{debug, info};

/// Result of encoding a whole corpus
#[derive(Debug)]
pub struct BatchResult {
    /// One embedding per input text, in input order
    pub embeddings: Vec<Vec<f32>>,
    pub batches: usize,
    pub duration_ms: u64,
}

/// Encodes corpus texts in fixed-size batches
///
/// Any failing batch aborts the whole run: an index must never be built
/// over a partial set of embeddings.
pub struct BatchProcessor<'p> {
    provider: &'p dyn EmbeddingProvider,
    batch_size: usize,
}

impl<'p> BatchProcessor<'p> {
    /// Create a new batch processor
    ///
    /// # Arguments
    /// * `provider` - Embedding provider
    /// * `batch_size` - Number of texts to embed in one call (minimum 1)
    pub fn new(provider: &'p dyn EmbeddingProvider, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Encode every text, preserving order
    pub fn process(&self, texts: &[String]) -> Result<BatchResult, EmbeddingError> {
        let start = Instant::now();
        let total = texts.len();

        info!(
            "Generating embeddings for {} texts with {} (batch size {})",
            total,
            self.provider.model_name(),
            self.batch_size
        );

        let mut embeddings = Vec::with_capacity(total);
        let mut batches = 0;

        for batch in texts.chunks(self.batch_size) {
            let batch_embeddings = self.provider.embed_batch(batch)?;

            if batch_embeddings.len() != batch.len() {
                return Err(EmbeddingError::GenerationError(format!(
                    "Embedding count mismatch: expected {}, got {}",
                    batch.len(),
                    batch_embeddings.len()
                )));
            }

            embeddings.extend(batch_embeddings);
            batches += 1;
            debug!("Embedded {}/{} texts", embeddings.len(), total);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Embedding complete: {} texts in {} batches, {}ms",
            embeddings.len(),
            batches,
            duration_ms
        );

        Ok(BatchResult {
            embeddings,
            batches,
            duration_ms,
        })
    }
}
