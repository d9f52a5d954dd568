//! Document ingestion: metadata attachment and chunking
//!
//! Text extraction and metadata loading happen upstream. This module receives
//! their output, matches metadata to documents by filename and turns the
//! documents into one shared chunk collection.

use crate::chunking::{Chunk, DocumentMetadata, RecursiveChunker};
use crate::retrieval::ChunkCollection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Text extracted from one source document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub filename: String,
    pub text: String,
    pub num_pages: usize,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    pub fn new(filename: impl Into<String>, text: impl Into<String>, num_pages: usize) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
            num_pages,
            metadata: DocumentMetadata::new(),
        }
    }
}

/// Attach metadata records to documents by exact filename match.
///
/// Documents without a matching record get an empty one.
pub fn attach_metadata(
    documents: &mut [ExtractedDocument],
    metadata: &HashMap<String, DocumentMetadata>,
) {
    for document in documents.iter_mut() {
        document.metadata = metadata
            .get(&document.filename)
            .cloned()
            .unwrap_or_default();
    }
}

/// Turns extracted documents into a chunk collection
#[derive(Debug, Clone, Default)]
pub struct IngestionPipeline {
    chunker: RecursiveChunker,
}

impl IngestionPipeline {
    pub fn new(chunker: RecursiveChunker) -> Self {
        Self { chunker }
    }

    pub fn chunker(&self) -> &RecursiveChunker {
        &self.chunker
    }

    /// Attach metadata and chunk every document, preserving document order
    pub fn ingest(
        &self,
        mut documents: Vec<ExtractedDocument>,
        metadata: &HashMap<String, DocumentMetadata>,
    ) -> ChunkCollection {
        attach_metadata(&mut documents, metadata);

        let matched = documents
            .iter()
            .filter(|d| metadata.contains_key(&d.filename))
            .count();
        debug!(
            "Matched metadata for {}/{} documents",
            matched,
            documents.len()
        );

        let mut chunks: Vec<Chunk> = Vec::new();
        for document in &documents {
            let doc_chunks = self.chunker.chunk_document(document);
            if doc_chunks.is_empty() {
                debug!("Document {} produced no chunks", document.filename);
                continue;
            }
            chunks.extend(doc_chunks);
        }

        info!(
            "Created {} chunks from {} documents (budget {} tokens)",
            chunks.len(),
            documents.len(),
            self.chunker.chunk_size()
        );

        ChunkCollection::new(chunks)
    }
}
