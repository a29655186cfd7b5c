//! Docent Vector - Vector store abstraction
//!
//! Provides the [`VectorStore`] trait over two interchangeable backends
//! (a file-backed local index and a remote Qdrant collection) plus the
//! embedding client used to produce the vectors they hold.

use async_trait::async_trait;
use docent_core::{Chunk, Result, ScoredChunk};
use serde::{Deserialize, Serialize};

pub mod embedding;
pub mod local_index;
pub mod qdrant_store;

pub use embedding::{create_embedding_client, EmbeddingClient, GeminiEmbedding};
pub use local_index::LocalIndex;
pub use qdrant_store::QdrantStore;

/// A chunk paired with its embedding vector, ready for indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// Trait for vector store backends
///
/// Both variants share one capability set: bulk append and top-k similarity
/// search, with an optional persistence hook. Records are never deduplicated:
/// adding the same documents twice produces duplicate entries. All vectors in
/// one store share a single dimension; a mismatched record or query fails
/// with [`docent_core::DocentError::DimensionMismatch`] before anything is
/// written.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append records in bulk; returns the number of records written
    async fn add_records(&self, records: &[EmbeddedChunk]) -> Result<usize>;

    /// Return the `k` records most similar to `query`, most similar first
    ///
    /// `k` must be at least 1. Requesting more records than the store holds
    /// returns all available records. Ties are broken by insertion order.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Flush state to durable storage (no-op for remote backends)
    async fn persist(&self) -> Result<()> {
        Ok(())
    }

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Validate record dimensions against the store's established dimension.
///
/// Checks the whole batch up front so a mismatch rejects the write before
/// any record is stored, and names the offending record.
pub(crate) fn check_batch_dimensions(records: &[EmbeddedChunk], expected: usize) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        if record.vector.len() != expected {
            return Err(docent_core::DocentError::DimensionMismatch {
                expected,
                actual: record.vector.len(),
                context: format!("record {index}"),
            });
        }
    }
    Ok(())
}

/// Validate a query vector's dimension.
pub(crate) fn check_query_dimension(query: &[f32], expected: usize) -> Result<()> {
    if query.len() != expected {
        return Err(docent_core::DocentError::DimensionMismatch {
            expected,
            actual: query.len(),
            context: "query vector".to_string(),
        });
    }
    Ok(())
}
