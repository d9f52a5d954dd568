//! Studyrag - Chunking and hybrid retrieval for educational documents
//!
//! Turns extracted document text into token-budgeted chunks, indexes them
//! twice (BM25 and sentence embeddings), and answers top-k queries by
//! fusing both rankings with Reciprocal Rank Fusion.
//!
//! ```no_run
//! use studyrag::{Config, ExtractedDocument, HybridRetriever, IngestionPipeline, RecursiveChunker};
//! use std::collections::HashMap;
//!
//! # fn main() -> studyrag::Result<()> {
//! let config = Config::default();
//! let pipeline = IngestionPipeline::new(RecursiveChunker::from_config(&config.chunking));
//! let documents = vec![ExtractedDocument::new("physics.pdf", "Force equals mass times acceleration.", 1)];
//! let chunks = pipeline.ingest(documents, &HashMap::new());
//!
//! let retriever = HybridRetriever::new(chunks, &config)?;
//! for hit in retriever.search("force mass acceleration", &retriever.default_options()) {
//!     println!("{:.4} {}", hit.score, hit.chunk.preview(80));
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod retrieval;

pub use chunking::{Chunk, DocumentMetadata, RecursiveChunker};
pub use config::Config;
pub use error::{Result, StudyragError};
pub use ingestion::{ExtractedDocument, IngestionPipeline};
pub use retrieval::{
    ChunkCollection, FusedChunk, HybridRetriever, LexicalRetriever, ScoredChunk, SearchOptions,
    SemanticRetriever,
};
