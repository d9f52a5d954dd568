//! BM25 keyword retrieval over the chunk collection
//!
//! Wraps the [`bm25`](https://crates.io/crates/bm25) crate: chunks are embedded
//! as sparse BM25 term vectors with our own tokenizer and scored against the
//! query embedding. Every chunk gets a score for every query, including zero,
//! so a query with no recognized terms still ranks the whole collection in
//! insertion order.

use super::{retain_above, ChunkCollection, ScoredChunk};
use crate::error::{Result, StudyragError};
use bm25::{Embedder, EmbedderBuilder, Scorer};
use regex::Regex;
use tracing::{debug, info, instrument};

/// BM25 free parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation
    pub k1: f32,
    /// Length normalization strength
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Lowercases text and extracts word-character runs
///
/// No stemming and no stopword removal; punctuation never forms a token.
#[derive(Debug, Clone)]
pub struct LexicalTokenizer {
    word: Regex,
}

impl LexicalTokenizer {
    pub fn new() -> Result<Self> {
        let word = Regex::new(r"\w+")
            .map_err(|e| StudyragError::Config(format!("Invalid token pattern: {}", e)))?;
        Ok(Self { word })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.words(text)
    }

    fn words(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.word
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl bm25::Tokenizer for LexicalTokenizer {
    fn tokenize(&self, input_text: &str) -> Vec<String> {
        self.words(input_text)
    }
}

/// BM25-based retriever for keyword search
pub struct LexicalRetriever {
    chunks: ChunkCollection,
    tokenizer: LexicalTokenizer,
    embedder: Embedder<u64, LexicalTokenizer>,
    /// Sparse BM25 vectors keyed by collection index
    scorer: Scorer<usize, u64>,
}

impl std::fmt::Debug for LexicalRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalRetriever")
            .field("chunks", &self.chunks.len())
            .field("tokenizer", &self.tokenizer)
            .finish()
    }
}

impl LexicalRetriever {
    /// Build the index with default BM25 parameters
    pub fn new(chunks: ChunkCollection) -> Result<Self> {
        Self::with_params(chunks, Bm25Params::default())
    }

    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub fn with_params(chunks: ChunkCollection, params: Bm25Params) -> Result<Self> {
        if chunks.is_empty() {
            return Err(StudyragError::EmptyCorpus);
        }

        let tokenizer = LexicalTokenizer::new()?;
        let corpus: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        let embedder = EmbedderBuilder::<u64, LexicalTokenizer>::with_tokenizer_and_fit_to_corpus(
            tokenizer.clone(),
            &corpus,
        )
        .k1(params.k1)
        .b(params.b)
        .build();

        let mut scorer = Scorer::<usize, u64>::new();
        for (index, text) in corpus.iter().enumerate() {
            scorer.upsert(&index, embedder.embed(text));
        }

        info!(
            "Built BM25 index: {} chunks, avg length {:.1} tokens",
            chunks.len(),
            embedder.avgdl()
        );

        Ok(Self {
            chunks,
            tokenizer,
            embedder,
            scorer,
        })
    }

    pub fn chunks(&self) -> &ChunkCollection {
        &self.chunks
    }

    pub fn tokenizer(&self) -> &LexicalTokenizer {
        &self.tokenizer
    }

    /// BM25 score of every chunk for `query`, in collection order
    pub fn scores(&self, query: &str) -> Vec<f32> {
        if self.tokenizer.tokenize(query).is_empty() {
            debug!("Query has no word tokens; every chunk scores 0");
        }
        let query_embedding = self.embedder.embed(query);

        (0..self.chunks.len())
            .map(|index| {
                self.scorer
                    .score(&index, &query_embedding)
                    .filter(|score| score.is_finite())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Top-k chunks by BM25 score, ties in collection order
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredChunk<'_>> {
        let scores = self.scores(query);

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(top_k);

        order
            .into_iter()
            .map(|index| ScoredChunk {
                index,
                chunk: &self.chunks[index],
                score: scores[index],
            })
            .collect()
    }

    /// Top-k results, then only those scoring at least `min_score`
    pub fn search_with_threshold(
        &self,
        query: &str,
        min_score: f32,
        top_k: usize,
    ) -> Vec<ScoredChunk<'_>> {
        let mut results = self.search(query, top_k);
        retain_above(&mut results, min_score);
        results
    }
}
