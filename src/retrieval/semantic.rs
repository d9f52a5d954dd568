//! Dense-vector retrieval over the chunk collection

use super::{retain_above, ChunkCollection, ScoredChunk};
use crate::config::EmbeddingConfig;
use crate::embedding::{
    BatchProcessor, EmbeddingError, EmbeddingProvider, FastEmbedOptions, FastEmbedProvider,
    SnapshotHeader, VectorIndex, VectorIndexError,
};
use crate::error::{Result, StudyragError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Semantic retriever using sentence embeddings and exact cosine search
pub struct SemanticRetriever {
    chunks: ChunkCollection,
    provider: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
}

impl std::fmt::Debug for SemanticRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticRetriever")
            .field("chunks", &self.chunks.len())
            .field("model", &self.provider.model_name())
            .field("dimension", &self.index.dimension())
            .finish()
    }
}

impl SemanticRetriever {
    /// Load the configured FastEmbed model and index every chunk
    ///
    /// The model name is checked before anything is downloaded, and an empty
    /// corpus is rejected before the model is loaded.
    pub fn new(chunks: ChunkCollection, config: &EmbeddingConfig) -> Result<Self> {
        if !FastEmbedProvider::is_supported(&config.model) {
            return Err(StudyragError::InvalidEmbeddingModel {
                model: config.model.clone(),
                supported: FastEmbedProvider::supported_models().join(", "),
            });
        }
        if chunks.is_empty() {
            return Err(StudyragError::EmptyCorpus);
        }

        let provider = FastEmbedProvider::new(
            &config.model,
            FastEmbedOptions {
                cache_dir: Some(config.resolved_cache_dir()),
                show_download_progress: config.show_download_progress,
            },
        )
        .map_err(model_error)?;

        Self::with_provider(chunks, Arc::new(provider), config.batch_size)
    }

    /// Index every chunk with an already-constructed provider
    #[instrument(skip_all, fields(chunks = chunks.len(), model = provider.model_name()))]
    pub fn with_provider(
        chunks: ChunkCollection,
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(StudyragError::EmptyCorpus);
        }

        let texts = chunks.texts();
        let batch = BatchProcessor::new(provider.as_ref(), batch_size).process(&texts)?;
        let index = VectorIndex::from_embeddings(provider.dimension(), &batch.embeddings)?;

        info!(
            "Vector index ready with {} vectors ({}D, {})",
            index.len(),
            index.dimension(),
            provider.model_name()
        );

        Ok(Self {
            chunks,
            provider,
            index,
        })
    }

    /// Restore from a snapshot instead of re-encoding the corpus
    ///
    /// Fails if the snapshot was built with another model or from other chunk
    /// texts, since its rows would no longer line up with the collection.
    pub fn from_snapshot(
        chunks: ChunkCollection,
        provider: Arc<dyn EmbeddingProvider>,
        bytes: &[u8],
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(StudyragError::EmptyCorpus);
        }

        let (index, header) = VectorIndex::from_bytes(bytes)?;

        if header.model != provider.model_name() {
            return Err(VectorIndexError::SnapshotMismatch(format!(
                "built with model {}, provider is {}",
                header.model,
                provider.model_name()
            ))
            .into());
        }
        if header.fingerprint != chunks.fingerprint() {
            return Err(
                VectorIndexError::SnapshotMismatch("chunk texts differ".to_string()).into(),
            );
        }
        if index.len() != chunks.len() || index.dimension() != provider.dimension() {
            return Err(VectorIndexError::SnapshotMismatch(format!(
                "snapshot has {} x {}D vectors, expected {} x {}D",
                index.len(),
                index.dimension(),
                chunks.len(),
                provider.dimension()
            ))
            .into());
        }

        info!("Restored vector index with {} vectors", index.len());

        Ok(Self {
            chunks,
            provider,
            index,
        })
    }

    /// Restore from a snapshot file written by [`SemanticRetriever::save_index`]
    pub fn load_index(
        chunks: ChunkCollection,
        provider: Arc<dyn EmbeddingProvider>,
        path: &Path,
    ) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| StudyragError::Io {
            source: e,
            context: format!("Failed to read vector index snapshot: {:?}", path),
        })?;
        Self::from_snapshot(chunks, provider, &bytes)
    }

    /// Serialize the vector index, tagged with model and corpus fingerprint
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(self.index.to_bytes(&self.snapshot_header())?)
    }

    pub fn save_index(&self, path: &Path) -> Result<()> {
        self.index.save(path, &self.snapshot_header())?;
        info!("Saved vector index to {:?}", path);
        Ok(())
    }

    fn snapshot_header(&self) -> SnapshotHeader {
        SnapshotHeader {
            model: self.provider.model_name().to_string(),
            fingerprint: self.chunks.fingerprint(),
        }
    }

    pub fn chunks(&self) -> &ChunkCollection {
        &self.chunks
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Top-k chunks by cosine similarity, ties in collection order
    ///
    /// A query that cannot be encoded (e.g. empty) yields no results.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredChunk<'_>> {
        if top_k == 0 {
            return Vec::new();
        }
        if query.trim().is_empty() {
            debug!("Empty query; no semantic results");
            return Vec::new();
        }

        let query_embedding = match self.provider.embed(query) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Failed to embed query: {}", e);
                return Vec::new();
            }
        };

        match self.index.search(&query_embedding, top_k) {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| ScoredChunk {
                    index: hit.id,
                    chunk: &self.chunks[hit.id],
                    score: hit.score,
                })
                .collect(),
            Err(e) => {
                warn!("Vector search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Top-k results, then only those with similarity at least `threshold`
    pub fn search_with_threshold(
        &self,
        query: &str,
        threshold: f32,
        top_k: usize,
    ) -> Vec<ScoredChunk<'_>> {
        let mut results = self.search(query, top_k);
        retain_above(&mut results, threshold);
        results
    }
}

fn model_error(e: EmbeddingError) -> StudyragError {
    match e {
        EmbeddingError::UnsupportedModel { model, supported } => {
            StudyragError::InvalidEmbeddingModel { model, supported }
        }
        other => StudyragError::Embedding(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveChunker;
    use crate::retrieval::testing::VocabProvider;

    fn collection() -> ChunkCollection {
        let chunker = RecursiveChunker::default();
        [
            "Slope measures how steep a line is.",
            "Force equals mass times acceleration.",
            "The cell converts food to energy.",
        ]
        .iter()
        .flat_map(|text| chunker.chunk_text(text))
        .collect()
    }

    fn retriever() -> SemanticRetriever {
        SemanticRetriever::with_provider(collection(), Arc::new(VocabProvider::new()), 2).unwrap()
    }

    #[test]
    fn test_nearest_chunk_first() {
        let retriever = retriever();
        let results = retriever.search("what is force and mass", 3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].index, 1);
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!(results.iter().all(|r| (-1.0..=1.0001).contains(&r.score)));
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let retriever = retriever();
        assert!(retriever.search("", 3).is_empty());
        assert!(retriever.search("   ", 3).is_empty());
        assert!(retriever.search("force", 0).is_empty());
    }

    #[test]
    fn test_unknown_words_tie_in_insertion_order() {
        let retriever = retriever();
        let indices: Vec<usize> = retriever
            .search("photosynthesis", 3)
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_threshold_monotonic() {
        let retriever = retriever();
        let mut previous = usize::MAX;
        for threshold in [-1.0, 0.0, 0.3, 0.9, 1.5] {
            let results = retriever.search_with_threshold("slope of a line and energy", threshold, 3);
            assert!(results.iter().all(|r| r.score >= threshold));
            assert!(results.len() <= previous);
            previous = results.len();
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let result = SemanticRetriever::with_provider(
            ChunkCollection::new(Vec::new()),
            Arc::new(VocabProvider::new()),
            8,
        );
        assert!(matches!(result, Err(StudyragError::EmptyCorpus)));
    }

    #[test]
    fn test_invalid_model_rejected() {
        let config = EmbeddingConfig {
            model: "no-such-model".to_string(),
            ..EmbeddingConfig::default()
        };
        let result = SemanticRetriever::new(collection(), &config);
        assert!(matches!(
            result,
            Err(StudyragError::InvalidEmbeddingModel { .. })
        ));
    }

    #[test]
    fn test_empty_corpus_checked_before_model_load() {
        let config = EmbeddingConfig::default();
        let result = SemanticRetriever::new(ChunkCollection::new(Vec::new()), &config);
        assert!(matches!(result, Err(StudyragError::EmptyCorpus)));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let original = retriever();
        let bytes = original.snapshot().unwrap();

        let restored = SemanticRetriever::from_snapshot(
            original.chunks().clone(),
            Arc::new(VocabProvider::new()),
            &bytes,
        )
        .unwrap();

        let a: Vec<usize> = original.search("cell energy", 3).iter().map(|r| r.index).collect();
        let b: Vec<usize> = restored.search("cell energy", 3).iter().map(|r| r.index).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_rejected_for_other_corpus() {
        let bytes = retriever().snapshot().unwrap();
        let other: ChunkCollection = RecursiveChunker::default()
            .chunk_text("A different corpus entirely.")
            .into_iter()
            .collect();

        let result = SemanticRetriever::from_snapshot(other, Arc::new(VocabProvider::new()), &bytes);
        assert!(matches!(
            result,
            Err(StudyragError::VectorIndex(VectorIndexError::SnapshotMismatch(_)))
        ));
    }
}
