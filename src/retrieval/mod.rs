//! Hybrid retrieval
//!
//! A lexical (BM25) and a semantic (embedding) retriever index the same
//! shared chunk collection. The hybrid retriever fuses their ranked lists
//! with Reciprocal Rank Fusion. Chunks are identified across lists by their
//! position in that shared collection.

mod fusion;
mod hybrid;
mod lexical;
mod semantic;
#[cfg(test)]
mod testing;

pub use fusion::{reciprocal_rank_fusion, FusedEntry, FusionConfig, FusionError, DEFAULT_RRF_K};
pub use hybrid::{FusedChunk, HybridRetriever, SearchOptions};
pub use lexical::{Bm25Params, LexicalRetriever, LexicalTokenizer};
pub use semantic::SemanticRetriever;

use crate::chunking::Chunk;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable, shared collection of chunks
///
/// Cloning is cheap and every clone refers to the same chunks, so indices
/// built from clones stay aligned with each other.
#[derive(Debug, Clone)]
pub struct ChunkCollection {
    chunks: Arc<[Chunk]>,
}

impl ChunkCollection {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    /// True if both handles point at the same underlying chunks
    pub fn ptr_eq(&self, other: &ChunkCollection) -> bool {
        Arc::ptr_eq(&self.chunks, &other.chunks)
    }

    /// BLAKE3 hash over every chunk text, in order
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for chunk in self.chunks.iter() {
            hasher.update(&(chunk.text.len() as u64).to_le_bytes());
            hasher.update(chunk.text.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Chunk texts in collection order
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }
}

impl Deref for ChunkCollection {
    type Target = [Chunk];

    fn deref(&self) -> &[Chunk] {
        &self.chunks
    }
}

impl From<Vec<Chunk>> for ChunkCollection {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self::new(chunks)
    }
}

impl FromIterator<Chunk> for ChunkCollection {
    fn from_iter<I: IntoIterator<Item = Chunk>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A chunk with the score one retriever gave it
///
/// Lexical scores are unbounded non-negative BM25 values; semantic scores
/// are cosine similarities in [-1, 1]. The two are not comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChunk<'a> {
    /// Position of the chunk in the shared collection
    pub index: usize,
    pub chunk: &'a Chunk,
    pub score: f32,
}

/// Keep results scoring at least `min_score`; applied after top-k
pub(crate) fn retain_above(results: &mut Vec<ScoredChunk<'_>>, min_score: f32) {
    results.retain(|r| r.score >= min_score);
}
