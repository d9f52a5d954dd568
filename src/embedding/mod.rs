//! Embedding & dense indexing
//!
//! - `EmbeddingProvider` trait for abstraction over encoders
//! - `FastEmbedProvider` for local embedding (all-MiniLM-L6-v2, 384-dim, by default)
//! - `BatchProcessor` for encoding a corpus in batches
//! - `VectorIndex` for exact cosine similarity search, with snapshots
mod batch;
mod provider;
mod vector_index;

pub use batch::{BatchProcessor, BatchResult};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedOptions, FastEmbedProvider};
pub use vector_index::{normalize, SearchResult, SnapshotHeader, VectorIndex, VectorIndexError};
