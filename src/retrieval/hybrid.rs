//! Hybrid search combining semantic and keyword search

use super::{
    reciprocal_rank_fusion, ChunkCollection, FusionConfig, LexicalRetriever, ScoredChunk,
    SemanticRetriever,
};
use crate::chunking::Chunk;
use crate::config::{Config, RetrievalConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, StudyragError};
use std::sync::Arc;
use tracing::debug;

/// Per-query knobs for hybrid search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Number of fused results returned
    pub top_k: usize,
    /// Semantic weight; clamped into [0, 1]
    pub alpha: f32,
    /// Lexical candidates fetched before fusion
    pub lexical_k: usize,
    /// Semantic candidates fetched before fusion
    pub semantic_k: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for SearchOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            alpha: config.alpha,
            lexical_k: config.lexical_k,
            semantic_k: config.semantic_k,
        }
    }
}

impl SearchOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

/// A chunk ranked by fused RRF score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedChunk<'a> {
    /// Position of the chunk in the shared collection
    pub index: usize,
    pub chunk: &'a Chunk,
    pub score: f32,
    pub lexical_rrf: f32,
    pub semantic_rrf: f32,
    pub lexical_rank: Option<usize>,
    pub semantic_rank: Option<usize>,
}

/// Hybrid retriever owning a lexical and a semantic retriever over one collection
#[derive(Debug)]
pub struct HybridRetriever {
    chunks: ChunkCollection,
    lexical: LexicalRetriever,
    semantic: SemanticRetriever,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Build both indices, loading the configured FastEmbed model
    pub fn new(chunks: ChunkCollection, config: &Config) -> Result<Self> {
        let semantic = SemanticRetriever::new(chunks.clone(), &config.embedding)?;
        let lexical = LexicalRetriever::new(chunks)?;
        Self::from_retrievers(lexical, semantic, config.retrieval.clone())
    }

    /// Build both indices with an already-constructed embedding provider
    pub fn with_provider(
        chunks: ChunkCollection,
        provider: Arc<dyn EmbeddingProvider>,
        config: &Config,
    ) -> Result<Self> {
        let lexical = LexicalRetriever::new(chunks.clone())?;
        let semantic =
            SemanticRetriever::with_provider(chunks, provider, config.embedding.batch_size)?;
        Self::from_retrievers(lexical, semantic, config.retrieval.clone())
    }

    /// Compose retrievers that were built over the same collection handle
    pub fn from_retrievers(
        lexical: LexicalRetriever,
        semantic: SemanticRetriever,
        config: RetrievalConfig,
    ) -> Result<Self> {
        if !lexical.chunks().ptr_eq(semantic.chunks()) {
            return Err(StudyragError::Config(
                "Lexical and semantic retrievers must share one chunk collection".to_string(),
            ));
        }

        Ok(Self {
            chunks: lexical.chunks().clone(),
            lexical,
            semantic,
            config,
        })
    }

    pub fn chunks(&self) -> &ChunkCollection {
        &self.chunks
    }

    pub fn lexical(&self) -> &LexicalRetriever {
        &self.lexical
    }

    pub fn semantic(&self) -> &SemanticRetriever {
        &self.semantic
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Options built from the retrieval config
    pub fn default_options(&self) -> SearchOptions {
        SearchOptions::from(&self.config)
    }

    /// Fuse the over-fetched lexical and semantic lists and keep the top-k
    ///
    /// Only chunks with a nonzero fused score are returned, so the result
    /// can be shorter than `top_k`.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<FusedChunk<'_>> {
        let fusion = FusionConfig::clamped(self.config.rrf_k, options.alpha);

        let lexical: Vec<usize> = self
            .lexical
            .search(query, options.lexical_k)
            .iter()
            .map(|r| r.index)
            .collect();
        let semantic: Vec<usize> = self
            .semantic
            .search(query, options.semantic_k)
            .iter()
            .map(|r| r.index)
            .collect();

        let mut fused = reciprocal_rank_fusion(&lexical, &semantic, &fusion);
        let candidates = fused.len();
        fused.truncate(options.top_k);

        debug!(
            "Hybrid search: {} lexical + {} semantic candidates -> {} fused, {} returned (alpha {})",
            lexical.len(),
            semantic.len(),
            candidates,
            fused.len(),
            fusion.alpha
        );

        fused
            .into_iter()
            .map(|entry| FusedChunk {
                index: entry.id,
                chunk: &self.chunks[entry.id],
                score: entry.score,
                lexical_rrf: entry.lexical_rrf,
                semantic_rrf: entry.semantic_rrf,
                lexical_rank: entry.lexical_rank,
                semantic_rank: entry.semantic_rank,
            })
            .collect()
    }

    /// Raw BM25 ranking, bypassing fusion
    pub fn search_bm25_only(&self, query: &str, top_k: usize) -> Vec<ScoredChunk<'_>> {
        self.lexical.search(query, top_k)
    }

    /// Raw cosine ranking, bypassing fusion
    pub fn search_embedding_only(&self, query: &str, top_k: usize) -> Vec<ScoredChunk<'_>> {
        self.semantic.search(query, top_k)
    }

    /// BM25 ranking filtered by the configured `lexical_threshold`
    pub fn search_bm25_relevant(&self, query: &str, top_k: usize) -> Vec<ScoredChunk<'_>> {
        self.lexical
            .search_with_threshold(query, self.config.lexical_threshold, top_k)
    }

    /// Cosine ranking filtered by the configured `semantic_threshold`
    pub fn search_embedding_relevant(&self, query: &str, top_k: usize) -> Vec<ScoredChunk<'_>> {
        self.semantic
            .search_with_threshold(query, self.config.semantic_threshold, top_k)
    }
}
