//! Token counting used to enforce the chunk budget.

use crate::error::{Result, StudyragError};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::warn;

/// Counts tokens in a piece of text under one fixed scheme.
///
/// The count only decides whether a split fits the chunk budget; it is never
/// used as a ranking feature.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Human-readable scheme name, for logs
    fn name(&self) -> &str;
}

/// Model-free BPE estimate: one token per four bytes, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    fn name(&self) -> &str {
        "bytes/4"
    }
}

/// Exact counts from a HuggingFace `tokenizer.json`.
///
/// Use the tokenizer of the embedding model so chunk sizes predict what the
/// model will actually see.
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
    name: String,
}

impl HfTokenCounter {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            StudyragError::Config(format!("Failed to load tokenizer {:?}: {}", path, e))
        })?;

        Ok(Self::new(tokenizer, path.display().to_string()))
    }

    pub fn new(tokenizer: Tokenizer, name: impl Into<String>) -> Self {
        Self {
            tokenizer,
            name: name.into(),
        }
    }
}

impl TokenCounter for HfTokenCounter {
    /// A text that fails to encode counts as `usize::MAX`, so it never fits
    /// the budget and is split further instead.
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                warn!("Tokenizer {} failed to encode text: {}", self.name, e);
                usize::MAX
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveChunker;
    use std::sync::Arc;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::Whitespace;

    /// Word-level tokenizer over a tiny vocabulary, built in memory
    fn word_level(words: &[&str], with_unk: bool) -> Tokenizer {
        let mut vocab: Vec<(String, u32)> = words
            .iter()
            .enumerate()
            .map(|(id, word)| (word.to_string(), id as u32 + 1))
            .collect();
        if with_unk {
            vocab.push(("[UNK]".to_string(), 0));
        }

        let model = WordLevel::builder()
            .vocab(vocab.into_iter().collect())
            .unk_token("[UNK]".to_string())
            .build()
            .unwrap();

        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_pre_tokenizer(Some(Whitespace::default()));
        tokenizer
    }

    fn biology_counter() -> HfTokenCounter {
        HfTokenCounter::new(
            word_level(&["the", "cell", "divides", "grows", "nucleus", "."], true),
            "word-level",
        )
    }

    #[test]
    fn test_heuristic_counts() {
        let counter = HeuristicTokenCounter;
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("a"), 1);
        assert_eq!(counter.count("abcd"), 1);
        assert_eq!(counter.count("abcde"), 2);
    }

    #[test]
    fn test_hf_counts_words() {
        let counter = biology_counter();
        assert_eq!(counter.name(), "word-level");
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("the cell divides"), 3);
        // Unknown words map to [UNK]; punctuation is its own pre-token
        assert_eq!(counter.count("the nucleus holds dna."), 5);
    }

    #[test]
    fn test_hf_encode_failure_never_fits() {
        let counter = HfTokenCounter::new(word_level(&["cell"], false), "no-unk");
        assert_eq!(counter.count("cell"), 1);
        assert_eq!(counter.count("zebra"), usize::MAX);
    }

    #[test]
    fn test_hf_counter_keeps_chunks_in_budget() {
        let counter: Arc<dyn TokenCounter> = Arc::new(biology_counter());
        let chunker = RecursiveChunker::new(5).with_counter(counter.clone());

        let chunks = chunker.chunk_text("the cell divides. the cell grows. the nucleus holds dna.");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["the cell divides", "the cell grows", "the nucleus holds dna."]
        );
        for chunk in &chunks {
            assert!(chunk.token_count <= 5);
            assert_eq!(chunk.token_count, counter.count(&chunk.text));
        }
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let result = HfTokenCounter::from_file(Path::new("/nonexistent/tokenizer.json"));
        assert!(matches!(result, Err(StudyragError::Config(_))));
    }
}
