//! Shared fixtures for integration tests

#![allow(dead_code)]

use regex::Regex;
use std::collections::HashMap;
use studyrag::embedding::{EmbeddingError, EmbeddingProvider};
use studyrag::{ChunkCollection, DocumentMetadata, ExtractedDocument, IngestionPipeline, RecursiveChunker};

/// Hashed bag-of-words embeddings: each lowercase word bumps one bucket
pub struct HashedBowProvider {
    dimension: usize,
    word: Regex,
}

impl HashedBowProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            word: Regex::new(r"\w+").unwrap(),
        }
    }
}

impl Default for HashedBowProvider {
    fn default() -> Self {
        Self::new(8192)
    }
}

impl EmbeddingProvider for HashedBowProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for word in self.word.find_iter(&lowered) {
            let hash = blake3::hash(word.as_str().as_bytes());
            let bytes: [u8; 8] = hash.as_bytes()[..8].try_into().unwrap();
            let bucket = (u64::from_le_bytes(bytes) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashed-bow"
    }
}

pub fn record(subject: &str, grade_level: &str, topic: &str) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::new();
    metadata.insert("subject".to_string(), subject.to_string());
    metadata.insert("grade_level".to_string(), grade_level.to_string());
    metadata.insert("topic".to_string(), topic.to_string());
    metadata
}

/// One Mathematics and one Physics document with disjoint vocabulary
pub fn math_and_physics() -> ChunkCollection {
    let documents = vec![
        ExtractedDocument::new(
            "algebra.pdf",
            "Algebra studies equations with unknown variables. \
             A linear equation has a slope and an intercept.",
            2,
        ),
        ExtractedDocument::new(
            "mechanics.pdf",
            "Newton's second law says force equals mass times acceleration. \
             A larger force produces a larger acceleration.",
            3,
        ),
    ];

    let mut metadata = HashMap::new();
    metadata.insert(
        "algebra.pdf".to_string(),
        record("Mathematics", "9", "Linear equations"),
    );
    metadata.insert(
        "mechanics.pdf".to_string(),
        record("Physics", "10", "Newton's laws"),
    );

    IngestionPipeline::new(RecursiveChunker::default()).ingest(documents, &metadata)
}

/// Collection with one chunk per text
pub fn collection(texts: &[&str]) -> ChunkCollection {
    let chunker = RecursiveChunker::default();
    texts
        .iter()
        .flat_map(|text| chunker.chunk_text(text))
        .collect()
}
