//! Cosine-similarity vector index over transcript chunks.
//!
//! An index is an append-only arena of entries, each owning its unit-norm
//! vector and the chunk record it was computed from. Persisted indexes are
//! named artifacts held by an [`ArtifactStore`].

mod artifact;
mod fs;
mod memory;
mod sqlite;

pub use artifact::{
    decode_artifact, encode_artifact, validate_artifact_name, ArtifactBlobs, ArtifactStore,
    IndexManifest, FORMAT_VERSION,
};
pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;
pub use sqlite::SqliteArtifactStore;

use crate::chunking::ChunkRecord;
use crate::config::Settings;
use crate::error::{Result, VidaskError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One stored vector and the record it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// L2-normalised embedding.
    pub vector: Vec<f32>,
    /// Chunk the embedding was computed from.
    pub record: ChunkRecord,
}

/// A search result with score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The matched chunk.
    pub record: ChunkRecord,
    /// Cosine similarity in [-1, 1] (higher is better).
    pub score: f32,
}

/// In-memory cosine similarity index with a fixed dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    embedding_model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index for vectors produced by `embedding_model`.
    pub fn new(embedding_model: impl Into<String>, dimension: usize) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            dimension,
            entries: Vec::new(),
        }
    }

    /// Rebuild an index from already-normalised entries (artifact decoding).
    pub(crate) fn from_entries(
        embedding_model: String,
        dimension: usize,
        entries: Vec<IndexEntry>,
    ) -> Self {
        Self {
            embedding_model,
            dimension,
            entries,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Number of stored vectors.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Stored records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Manifest describing this index for persistence.
    pub fn manifest(&self) -> IndexManifest {
        IndexManifest::new(&self.embedding_model, self.dimension, self.count())
    }

    /// Append a batch of vectors with their records.
    ///
    /// The whole batch is validated before anything is stored, so a failed
    /// call leaves the index untouched.
    #[instrument(skip_all, fields(batch = vectors.len()))]
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, records: Vec<ChunkRecord>) -> Result<()> {
        if vectors.len() != records.len() {
            return Err(VidaskError::ArityMismatch {
                vectors: vectors.len(),
                records: records.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(VidaskError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        if vectors.is_empty() {
            return Ok(());
        }

        self.entries.reserve(vectors.len());
        for (mut vector, record) in vectors.into_iter().zip(records) {
            l2_normalize(&mut vector);
            self.entries.push(IndexEntry { vector, record });
        }

        debug!("Index now holds {} vectors", self.entries.len());
        Ok(())
    }

    /// Return up to `k` records ranked by descending cosine similarity.
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(VidaskError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, dot(&query, &entry.vector)))
            .collect();

        // Stable sort: ties stay in position order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| SearchHit {
                record: self.entries[pos].record.clone(),
                score,
            })
            .collect())
    }

    /// Persist this index under `name`.
    #[instrument(skip(self, store))]
    pub async fn save(&self, store: &dyn ArtifactStore, name: &str) -> Result<()> {
        let blobs = encode_artifact(self)?;
        store.put(name, &blobs).await
    }

    /// Load the index persisted under `name`.
    #[instrument(skip(store))]
    pub async fn load(store: &dyn ArtifactStore, name: &str) -> Result<Self> {
        let blobs = store.get(name).await?;
        decode_artifact(name, &blobs)
    }
}

/// Scale a vector to unit length in place. Zero vectors are left as is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Create the artifact store selected in settings.
pub fn create_store(settings: &Settings) -> Result<Arc<dyn ArtifactStore>> {
    match settings.index_store.provider.to_lowercase().as_str() {
        "fs" | "file" | "filesystem" => Ok(Arc::new(FsArtifactStore::new(settings.index_dir()))),
        "sqlite" => Ok(Arc::new(SqliteArtifactStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryArtifactStore::new())),
        other => Err(VidaskError::Config(format!(
            "Unknown index store provider: {}",
            other
        ))),
    }
}
