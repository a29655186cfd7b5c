//! File-backed local vector index
//!
//! An exact cosine-similarity index held in memory and serialized to a
//! directory. Writers hold the index lock for the whole save so a reader
//! never observes a partially written index; the on-disk files are replaced
//! atomically via temp-file + rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docent_core::{DocentError, Result, ScoredChunk};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{check_batch_dimensions, check_query_dimension, EmbeddedChunk, VectorStore};

const META_FILE: &str = "meta.json";
const RECORDS_FILE: &str = "records.json";

/// Index metadata persisted alongside the records
#[derive(Debug, Serialize, Deserialize)]
struct IndexMeta {
    collection: String,
    dimension: usize,
}

#[derive(Debug, Default)]
struct IndexState {
    /// False until the first write or a successful load. Searching an
    /// uninitialized index is the "run ingestion first" condition.
    initialized: bool,
    records: Vec<EmbeddedChunk>,
}

/// Local file-backed vector store
///
/// Records are kept in insertion order; searches scan all records and rank
/// by cosine similarity with stable ties.
#[derive(Debug)]
pub struct LocalIndex {
    path: PathBuf,
    collection: String,
    dimension: usize,
    state: RwLock<IndexState>,
}

impl LocalIndex {
    /// Attach to `path`, loading prior persisted state when present.
    ///
    /// A missing index is not an error here: the store starts empty and
    /// uninitialized, and `search` reports [`DocentError::IndexNotFound`]
    /// until ingestion has run.
    pub fn attach(
        path: impl Into<PathBuf>,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Result<Self> {
        let path = path.into();
        let collection = collection.into();

        if path.join(META_FILE).exists() {
            let index = Self::open(&path)?;
            if index.dimension != dimension {
                return Err(DocentError::Store(format!(
                    "index at {} holds {}-dimensional vectors but the embedding model produces {dimension}",
                    path.display(),
                    index.dimension
                )));
            }
            return Ok(index);
        }

        Ok(Self {
            path,
            collection,
            dimension,
            state: RwLock::new(IndexState::default()),
        })
    }

    /// Open a previously persisted index.
    ///
    /// Fails with [`DocentError::IndexNotFound`] when no persisted state
    /// exists at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let meta_path = path.join(META_FILE);

        if !meta_path.exists() {
            return Err(DocentError::IndexNotFound {
                path: path.display().to_string(),
            });
        }

        let meta: IndexMeta = read_json(&meta_path)?;
        let records: Vec<EmbeddedChunk> = read_json(&path.join(RECORDS_FILE))?;

        Ok(Self {
            path,
            collection: meta.collection,
            dimension: meta.dimension,
            state: RwLock::new(IndexState {
                initialized: true,
                records,
            }),
        })
    }

    /// Number of indexed records
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// True when the index holds no records
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Collection name this index was created for
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Compute cosine similarity between two vectors of equal dimension.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        DocentError::Store(format!("corrupt index file {}: {e}", path.display()))
    })
}

/// Serialize `value` to `path` atomically (write temp file, then rename).
fn write_json_atomic<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| DocentError::Store(format!("failed to serialize index: {e}")))?;
    let tmp = dir.join(format!("{file}.tmp"));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, dir.join(file))?;
    Ok(())
}

#[async_trait]
impl VectorStore for LocalIndex {
    async fn add_records(&self, records: &[EmbeddedChunk]) -> Result<usize> {
        check_batch_dimensions(records, self.dimension)?;

        let mut state = self.state.write().await;
        state.initialized = true;
        state.records.extend_from_slice(records);
        Ok(records.len())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(DocentError::InvalidInput(
                "k must be at least 1".to_string(),
            ));
        }
        check_query_dimension(query, self.dimension)?;

        let state = self.state.read().await;
        if !state.initialized {
            return Err(DocentError::IndexNotFound {
                path: self.path.display().to_string(),
            });
        }

        let mut scored: Vec<ScoredChunk> = state
            .records
            .iter()
            .map(|record| ScoredChunk {
                chunk: record.chunk.clone(),
                score: cosine_similarity(&record.vector, query),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn persist(&self) -> Result<()> {
        // Hold the write guard for the whole save: no reader can observe a
        // half-written index, and the guard is released on every exit path.
        let state = self.state.write().await;

        std::fs::create_dir_all(&self.path)?;
        write_json_atomic(
            &self.path,
            META_FILE,
            &IndexMeta {
                collection: self.collection.clone(),
                dimension: self.dimension,
            },
        )?;
        write_json_atomic(&self.path, RECORDS_FILE, &state.records)?;

        tracing::debug!(
            records = state.records.len(),
            path = %self.path.display(),
            "local index persisted"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }
}
