/// Exact inner-product vector index over L2-normalized embeddings
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// zstd level used for snapshots
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Snapshot does not match this corpus: {0}")]
    SnapshotMismatch(String),
}

/// Search result with row and similarity score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Row of the vector, i.e. its insertion position
    pub id: usize,
    /// Cosine similarity in [-1, 1], higher is more similar
    pub score: f32,
}

/// Identifies what a snapshot was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Embedding model that produced the vectors
    pub model: String,
    /// Hash of the chunk texts the vectors were computed from
    pub fingerprint: String,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    header: SnapshotHeader,
    dimension: usize,
    rows: usize,
    vectors: Vec<f32>,
}

/// Flat vector index with exact search
///
/// Every row is L2-normalized on insertion, so the inner product with a
/// normalized query is the cosine similarity. Search scans every row.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    vectors: Array2<f32>,
}

impl VectorIndex {
    /// Build an index from raw embeddings, normalizing each one
    ///
    /// # Arguments
    /// * `dimension` - Vector dimension (must match every embedding)
    /// * `embeddings` - One vector per row, in insertion order
    pub fn from_embeddings(
        dimension: usize,
        embeddings: &[Vec<f32>],
    ) -> Result<Self, VectorIndexError> {
        let mut flat = Vec::with_capacity(dimension * embeddings.len());
        for embedding in embeddings {
            if embedding.len() != dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            flat.extend_from_slice(embedding);
        }

        let mut vectors = Array2::from_shape_vec((embeddings.len(), dimension), flat)
            .map_err(|e| VectorIndexError::SerializationError(e.to_string()))?;

        for mut row in vectors.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|x| x / norm);
            }
        }

        Ok(Self { vectors })
    }

    /// Search for the k most similar rows
    ///
    /// # Returns
    /// Up to k results sorted by similarity descending, ties by row order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        if query.len() != self.dimension() {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query = normalize(ArrayView1::from(query));
        let scores = self.vectors.dot(&query);

        let mut results: Vec<SearchResult> = scores
            .iter()
            .enumerate()
            .map(|(id, &score)| SearchResult { id, score })
            .collect();

        // Stable sort keeps row order among equal scores
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        Ok(results)
    }

    /// Normalized vector stored at `row`
    pub fn vector(&self, row: usize) -> Option<ArrayView1<'_, f32>> {
        (row < self.len()).then(|| self.vectors.row(row))
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get vector dimension
    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Serialize into a compressed snapshot
    pub fn to_bytes(&self, header: &SnapshotHeader) -> Result<Vec<u8>, VectorIndexError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            header: header.clone(),
            dimension: self.dimension(),
            rows: self.len(),
            vectors: self.vectors.iter().copied().collect(),
        };

        let json = serde_json::to_vec(&snapshot)
            .map_err(|e| VectorIndexError::SerializationError(e.to_string()))?;

        Ok(zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?)
    }

    /// Restore an index from a snapshot produced by [`VectorIndex::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, SnapshotHeader), VectorIndexError> {
        let json = zstd::decode_all(bytes)?;
        let snapshot: Snapshot = serde_json::from_slice(&json)
            .map_err(|e| VectorIndexError::SerializationError(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(VectorIndexError::SerializationError(format!(
                "Unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        let vectors = Array2::from_shape_vec((snapshot.rows, snapshot.dimension), snapshot.vectors)
            .map_err(|e| VectorIndexError::SerializationError(e.to_string()))?;

        Ok((Self { vectors }, snapshot.header))
    }

    /// Write a snapshot to a file
    pub fn save(&self, path: &Path, header: &SnapshotHeader) -> Result<(), VectorIndexError> {
        let bytes = self.to_bytes(header)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a snapshot from a file
    pub fn load(path: &Path) -> Result<(Self, SnapshotHeader), VectorIndexError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// L2-normalize a vector; the zero vector stays zero
pub fn normalize(vector: ArrayView1<'_, f32>) -> Array1<f32> {
    let norm = vector.dot(&vector).sqrt();
    if norm > 0.0 {
        vector.mapv(|x| x / norm)
    } else {
        vector.to_owned()
    }
}
