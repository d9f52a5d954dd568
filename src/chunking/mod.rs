//! Recursive, token-budgeted text chunking
//!
//! Text is split on the first separator of an ordered hierarchy (paragraph,
//! line, sentence, word). Any split still over the token budget is split again
//! with the remaining separators. The final separator is the empty string,
//! which cuts fixed-size character windows and cannot recurse further.

mod tokenizer;

pub use tokenizer::{HeuristicTokenCounter, HfTokenCounter, TokenCounter};

use crate::config::{ChunkingConfig, DEFAULT_SEPARATORS};
use crate::ingestion::ExtractedDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flat string-keyed document metadata (subject, grade_level, topic, ...)
pub type DocumentMetadata = BTreeMap<String, String>;

/// The atomic retrievable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequence number within one document's chunking pass
    pub chunk_id: usize,
    /// Trimmed, non-empty passage text
    pub text: String,
    pub token_count: usize,
    /// Approximate character offsets, accumulated from trimmed chunk lengths
    pub start_pos: usize,
    pub end_pos: usize,
    pub filename: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Chunk {
    pub fn subject(&self) -> Option<&str> {
        self.metadata.get("subject").map(String::as_str)
    }

    pub fn grade_level(&self) -> Option<&str> {
        self.metadata.get("grade_level").map(String::as_str)
    }

    pub fn topic(&self) -> Option<&str> {
        self.metadata.get("topic").map(String::as_str)
    }

    /// Short preview of the text (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &self.text[..idx]),
            None => self.text.clone(),
        }
    }
}

/// Splits documents into chunks that fit a token budget
#[derive(Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    separators: Vec<String>,
    counter: Arc<dyn TokenCounter>,
}

impl std::fmt::Debug for RecursiveChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveChunker")
            .field("chunk_size", &self.chunk_size)
            .field("separators", &self.separators)
            .field("counter", &self.counter.name())
            .finish()
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(512)
    }
}

impl RecursiveChunker {
    /// Chunker with the default separators and the heuristic token counter
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            counter: Arc::new(HeuristicTokenCounter),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size).with_separators(config.separators.clone())
    }

    /// Replace the separator hierarchy. The empty-string fallback is appended
    /// when missing so that splitting always terminates within budget.
    pub fn with_separators(mut self, mut separators: Vec<String>) -> Self {
        if separators.last().map_or(true, |s| !s.is_empty()) {
            separators.push(String::new());
        }
        self.separators = separators;
        self
    }

    pub fn with_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Chunk raw text. Filename and metadata are left empty.
    ///
    /// Empty or whitespace-only text yields no chunks.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let mut pieces = Vec::new();
        self.split_recursive(text, &self.separators, &mut pieces);

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut position = 0;
        for piece in pieces {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }

            let len = trimmed.chars().count();
            chunks.push(Chunk {
                chunk_id: chunks.len(),
                text: trimmed.to_string(),
                token_count: self.counter.count(trimmed),
                start_pos: position,
                end_pos: position + len,
                filename: String::new(),
                metadata: DocumentMetadata::new(),
            });
            position += len;
        }

        chunks
    }

    /// Chunk a document, stamping its filename and metadata on every chunk
    pub fn chunk_document(&self, document: &ExtractedDocument) -> Vec<Chunk> {
        let mut chunks = self.chunk_text(&document.text);
        for chunk in &mut chunks {
            chunk.filename = document.filename.clone();
            chunk.metadata = document.metadata.clone();
        }
        chunks
    }

    fn split_recursive<'t>(&self, text: &'t str, separators: &[String], out: &mut Vec<&'t str>) {
        if text.trim().is_empty() {
            return;
        }

        // The empty-string fallback and an exhausted list both cut windows
        let (separator, remaining) = match separators.split_first() {
            Some((separator, remaining)) if !separator.is_empty() => (separator, remaining),
            _ => {
                out.extend(char_windows(text, self.chunk_size));
                return;
            }
        };

        for split in text.split(separator.as_str()) {
            if split.trim().is_empty() {
                continue;
            }

            if self.counter.count(split) <= self.chunk_size {
                out.push(split);
            } else {
                self.split_recursive(split, remaining, out);
            }
        }
    }
}

/// Consecutive windows of at most `size` characters
fn char_windows(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(idx, _)| idx);
        let (window, tail) = rest.split_at(end);
        rest = tail;
        Some(window)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per whitespace-separated word
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }

        fn name(&self) -> &str {
            "words"
        }
    }

    fn word_chunker(chunk_size: usize) -> RecursiveChunker {
        RecursiveChunker::new(chunk_size).with_counter(Arc::new(WordCounter))
    }

    #[test]
    fn test_exhausted_separators_cut_windows() {
        let chunker = RecursiveChunker::new(4);
        let mut pieces = Vec::new();
        chunker.split_recursive("abcdefghij", &[], &mut pieces);
        assert_eq!(pieces, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_empty_text() {
        let chunker = RecursiveChunker::default();
        assert!(chunker.chunk_text("").is_empty());
        assert!(chunker.chunk_text("   \n\n\t  ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = RecursiveChunker::default();
        let chunks = chunker.chunk_text("  Photosynthesis converts light into energy.  \n");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Photosynthesis converts light into energy.");
        assert_eq!(chunks[0].chunk_id, 0);
        assert_eq!(chunks[0].start_pos, 0);
        assert_eq!(chunks[0].end_pos, chunks[0].text.len());
    }

    #[test]
    fn test_repeated_sentence_splits_within_budget() {
        let text = "Machine learning is artificial intelligence. ".repeat(50);
        let chunker = RecursiveChunker::new(512);
        let chunks = chunker.chunk_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 512);
            assert!(!chunk.text.trim().is_empty());
        }
    }

    #[test]
    fn test_paragraphs_kept_when_within_budget() {
        let chunker = word_chunker(5);
        let chunks = chunker.chunk_text("one two three\n\nfour five six seven\n\n\n\neight");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one two three", "four five six seven", "eight"]);
        let ids: Vec<usize> = chunks.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_falls_through_to_narrower_separators() {
        let chunker = word_chunker(3);
        let chunks = chunker.chunk_text("a b c d. e f\nshort line");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        // "a b c d. e f" is over budget on its line, so it drops to ". " then " "
        assert_eq!(texts, vec!["a", "b", "c", "d", "e f", "short line"]);
    }

    #[test]
    fn test_unbreakable_word_uses_character_windows() {
        let word = "x".repeat(25);
        let chunker = RecursiveChunker::new(4);
        let chunks = chunker.chunk_text(&word);

        let lens: Vec<usize> = chunks.iter().map(|c| c.text.len()).collect();
        assert_eq!(lens, vec![4, 4, 4, 4, 4, 4, 1]);
        let rejoined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rejoined, word);
    }

    #[test]
    fn test_positions_accumulate() {
        let chunker = word_chunker(2);
        let chunks = chunker.chunk_text("ab cd\n\nefg");

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start_pos, chunks[0].end_pos), (0, 5));
        assert_eq!((chunks[1].start_pos, chunks[1].end_pos), (5, 8));
    }

    #[test]
    fn test_char_windows_respect_utf8() {
        let windows: Vec<&str> = char_windows("ééééé", 2).collect();
        assert_eq!(windows, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_with_separators_appends_fallback() {
        let chunker = RecursiveChunker::new(8).with_separators(vec!["\n".to_string()]);
        assert_eq!(chunker.separators(), &["\n".to_string(), String::new()]);
    }

    #[test]
    fn test_chunk_document_stamps_metadata() {
        let mut metadata = DocumentMetadata::new();
        metadata.insert("subject".to_string(), "Mathematics".to_string());
        metadata.insert("grade_level".to_string(), "9".to_string());
        metadata.insert("topic".to_string(), "Algebra".to_string());

        let document = ExtractedDocument {
            filename: "test_math.pdf".to_string(),
            text: "Algebra is the study of mathematical symbols. ".repeat(30),
            num_pages: 1,
            metadata,
        };

        let chunks = RecursiveChunker::default().chunk_document(&document);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert_eq!(chunk.filename, "test_math.pdf");
            assert_eq!(chunk.subject(), Some("Mathematics"));
            assert_eq!(chunk.grade_level(), Some("9"));
            assert_eq!(chunk.topic(), Some("Algebra"));
        }
    }

    #[test]
    fn test_preview() {
        let chunk = RecursiveChunker::default()
            .chunk_text("Cells divide by mitosis.")
            .remove(0);
        assert_eq!(chunk.preview(5), "Cells...");
        assert_eq!(chunk.preview(100), "Cells divide by mitosis.");
    }
}
