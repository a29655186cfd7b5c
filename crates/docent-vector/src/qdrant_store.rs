//! Qdrant implementation for vector storage
//!
//! Remote vector-store variant addressed by (URL, collection name).
//! Connection management, collection bootstrap, and similarity search for
//! chunk embeddings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use docent_core::{Chunk, DocentError, Result, ScoredChunk};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{check_batch_dimensions, check_query_dimension, EmbeddedChunk, VectorStore};

/// Qdrant vector store
///
/// Each record is upserted under a fresh point ID, so re-ingesting the same
/// documents appends duplicates — the same append-only behaviour as the
/// local index. Insertion sequence numbers ride along in the payload to keep
/// tie-breaking stable.
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
    seq: AtomicU64,
}

/// Payload stored with each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorPayload {
    text: String,
    source: String,
    seq: u64,
}

impl QdrantStore {
    /// Connect to a Qdrant instance
    pub fn connect(
        url: &str,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DocentError::StoreUnavailable(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: collection.into(),
            dimension,
            seq: AtomicU64::new(0),
        })
    }

    /// Liveness check against the remote service
    pub async fn heartbeat(&self) -> Result<()> {
        self.client
            .health_check()
            .await
            .map_err(|e| DocentError::StoreUnavailable(format!("Qdrant heartbeat failed: {e}")))?;
        Ok(())
    }

    /// Initialize the collection (run once on setup)
    ///
    /// Creates the collection with cosine distance if it does not exist and
    /// seeds the insertion-sequence counter from the current point count.
    pub async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DocentError::Store(format!("failed to list collections: {e}")))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| DocentError::Store(format!("failed to create collection: {e}")))?;
            return Ok(());
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| DocentError::Store(format!("failed to read collection info: {e}")))?;
        let count = info.result.and_then(|r| r.points_count).unwrap_or(0);
        self.seq.store(count, Ordering::SeqCst);

        Ok(())
    }
}

fn payload_map(record: &EmbeddedChunk, seq: u64) -> HashMap<String, Value> {
    let payload = VectorPayload {
        text: record.chunk.text.clone(),
        source: record.chunk.metadata.source.clone(),
        seq,
    };

    serde_json::to_value(&payload)
        .unwrap_or_default()
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into()))
        .collect()
}

fn chunk_from_payload(payload: &HashMap<String, Value>) -> Chunk {
    let text = payload
        .get("text")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();
    let source = payload
        .get("source")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default();

    Chunk::new(text, source)
}

fn seq_from_payload(payload: &HashMap<String, Value>) -> u64 {
    payload
        .get("seq")
        .and_then(|v| v.as_integer())
        .unwrap_or(i64::MAX) as u64
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn add_records(&self, records: &[EmbeddedChunk]) -> Result<usize> {
        check_batch_dimensions(records, self.dimension)?;

        if records.is_empty() {
            return Ok(0);
        }

        let base = self.seq.fetch_add(records.len() as u64, Ordering::SeqCst);
        let points: Vec<PointStruct> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                PointStruct::new(
                    Uuid::new_v4().to_string(),
                    record.vector.clone(),
                    payload_map(record, base + i as u64),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await
            .map_err(|e| DocentError::Store(format!("failed to upsert vectors: {e}")))?;

        Ok(records.len())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(DocentError::InvalidInput(
                "k must be at least 1".to_string(),
            ));
        }
        check_query_dimension(query, self.dimension)?;

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DocentError::Store(format!("vector search failed: {e}")))?;

        let mut scored: Vec<(u64, ScoredChunk)> = results
            .result
            .into_iter()
            .map(|point| {
                (
                    seq_from_payload(&point.payload),
                    ScoredChunk {
                        chunk: chunk_from_payload(&point.payload),
                        score: point.score,
                    },
                )
            })
            .collect();

        // Qdrant already ranks by score; re-sort so equal scores fall back
        // to insertion order.
        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });

        Ok(scored.into_iter().map(|(_, s)| s).collect())
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, source: &str, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk::new(Chunk::new(text, source), vector)
    }

    #[test]
    fn test_payload_round_trip() {
        let rec = record("refund policy text", "policies.txt", vec![0.1, 0.2]);
        let payload = payload_map(&rec, 7);

        let chunk = chunk_from_payload(&payload);
        assert_eq!(chunk.text, "refund policy text");
        assert_eq!(chunk.metadata.source, "policies.txt");
        assert_eq!(seq_from_payload(&payload), 7);
    }

    #[test]
    fn test_missing_seq_sorts_last() {
        let payload = HashMap::new();
        assert_eq!(seq_from_payload(&payload), i64::MAX as u64);
    }

    #[tokio::test]
    async fn test_add_records_checks_dimensions_before_network() {
        // No Qdrant is running here; the dimension guard must fire before
        // any request is attempted.
        let store = QdrantStore::connect("http://localhost:6334", "test_docs", 3).unwrap();

        let err = store
            .add_records(&[record("bad", "a.txt", vec![1.0, 0.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, DocentError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_search_rejects_k_zero_before_network() {
        let store = QdrantStore::connect("http://localhost:6334", "test_docs", 3).unwrap();

        let err = store.search(&[1.0, 0.0, 0.0], 0).await.unwrap_err();
        assert!(matches!(err, DocentError::InvalidInput(_)));
    }
}
