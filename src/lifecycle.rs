//! Per-video index lifecycle: build once, reuse thereafter.
//!
//! The persisted artifact for a video is keyed by its identifier only. Once
//! it exists it is served as is; a changed upstream transcript is not
//! detected.

use crate::error::{Result, VidaskError};
use crate::vector_store::{ArtifactStore, VectorIndex};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

/// Derive the artifact name for a video identifier.
///
/// Identifiers are restricted to `[A-Za-z0-9_-]` so the mapping is injective
/// and safe as a file name.
pub fn artifact_name(video_id: &str) -> Result<String> {
    let valid = !video_id.is_empty()
        && video_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid {
        return Err(VidaskError::InvalidInput(format!(
            "Invalid video identifier: '{}'",
            video_id
        )));
    }
    Ok(format!("video_{}", video_id))
}

/// Result of [`IndexLifecycle::ensure_index`].
#[derive(Debug)]
pub struct EnsuredIndex {
    /// Artifact name the index is persisted under.
    pub name: String,
    pub index: VectorIndex,
    /// True when the index was loaded from an existing artifact.
    pub reused: bool,
}

/// Embedding identity an index must match to be usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingIdentity {
    pub model: String,
    pub dimension: usize,
}

/// Owns lookup, build and persistence of per-video indexes.
pub struct IndexLifecycle {
    store: Arc<dyn ArtifactStore>,
    expected: Option<EmbeddingIdentity>,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IndexLifecycle {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            expected: None,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Require loaded indexes to have been built with this embedding model.
    pub fn with_expected_embedding(mut self, model: &str, dimension: usize) -> Self {
        self.expected = Some(EmbeddingIdentity {
            model: model.to_string(),
            dimension,
        });
        self
    }

    pub fn store(&self) -> Arc<dyn ArtifactStore> {
        self.store.clone()
    }

    /// Return the index for `video_id`, building and persisting it on first use.
    ///
    /// `build` runs only when no artifact exists. Calls for the same
    /// identifier are serialised, so concurrent first requests build once and
    /// later ones reuse the result.
    #[instrument(skip(self, build))]
    pub async fn ensure_index<F, Fut>(&self, video_id: &str, build: F) -> Result<EnsuredIndex>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex>>,
    {
        let name = artifact_name(video_id)?;
        let key_lock = self.key_lock(&name)?;

        let result = {
            let _guard = key_lock.lock().await;
            self.load_or_build(&name, video_id, build).await
        };

        drop(key_lock);
        self.release_key(&name);
        result
    }

    async fn load_or_build<F, Fut>(
        &self,
        name: &str,
        video_id: &str,
        build: F,
    ) -> Result<EnsuredIndex>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex>>,
    {
        if self.store.exists(name).await? {
            info!("Loading existing index for video: {}", video_id);
            let index = self.load(name).await?;
            return Ok(EnsuredIndex {
                name: name.to_string(),
                index,
                reused: true,
            });
        }

        info!("Building index for video: {}", video_id);
        let index = build().await?;
        self.check_identity(&index)?;
        index.save(self.store.as_ref(), name).await?;

        Ok(EnsuredIndex {
            name: name.to_string(),
            index,
            reused: false,
        })
    }

    /// Load a persisted index by artifact name, checking its embedding identity.
    pub async fn load(&self, name: &str) -> Result<VectorIndex> {
        let index = VectorIndex::load(self.store.as_ref(), name).await?;
        self.check_identity(&index)?;
        Ok(index)
    }

    /// Names of all persisted indexes.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.store.list().await
    }

    fn check_identity(&self, index: &VectorIndex) -> Result<()> {
        let Some(expected) = &self.expected else {
            return Ok(());
        };

        if index.embedding_model() != expected.model {
            return Err(VidaskError::ModelMismatch {
                expected: index.embedding_model().to_string(),
                actual: expected.model.clone(),
            });
        }
        if index.dimension() != expected.dimension {
            return Err(VidaskError::DimensionMismatch {
                expected: index.dimension(),
                actual: expected.dimension,
            });
        }
        Ok(())
    }

    fn key_lock(&self, name: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .key_locks
            .lock()
            .map_err(|e| VidaskError::Config(format!("Failed to acquire lock: {}", e)))?;
        Ok(locks.entry(name.to_string()).or_default().clone())
    }

    /// Drop the lock entry for `name` once nobody else holds it.
    fn release_key(&self, name: &str) {
        if let Ok(mut locks) = self.key_locks.lock() {
            if locks.get(name).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkRecord;
    use crate::vector_store::{FsArtifactStore, MemoryArtifactStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn built_index(model: &str) -> VectorIndex {
        let mut index = VectorIndex::new(model, 2);
        index
            .add(
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                vec![
                    ChunkRecord::new(0, "alpha".to_string(), 0, 1),
                    ChunkRecord::new(1, "beta".to_string(), 1, 2),
                ],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name("dQw4w9WgXcQ").unwrap(), "video_dQw4w9WgXcQ");
        assert_eq!(artifact_name("a-b_c").unwrap(), "video_a-b_c");
        assert!(matches!(artifact_name(""), Err(VidaskError::InvalidInput(_))));
        assert!(artifact_name("a/b").is_err());
        assert!(artifact_name("a.b").is_err());
        assert_ne!(artifact_name("ab").unwrap(), artifact_name("aB").unwrap());
    }

    #[tokio::test]
    async fn test_builds_once_then_reuses() {
        let lifecycle = IndexLifecycle::new(Arc::new(MemoryArtifactStore::new()));
        let builds = AtomicUsize::new(0);

        let first = lifecycle
            .ensure_index("dQw4w9WgXcQ", || async {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(built_index("test-model"))
            })
            .await
            .unwrap();
        assert!(!first.reused);
        assert_eq!(first.name, "video_dQw4w9WgXcQ");

        let second = lifecycle
            .ensure_index("dQw4w9WgXcQ", || async {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(built_index("test-model"))
            })
            .await
            .unwrap();
        assert!(second.reused);
        assert_eq!(second.index, first.index);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_build_persists_nothing() {
        let store = Arc::new(MemoryArtifactStore::new());
        let lifecycle = IndexLifecycle::new(store.clone());

        let err = lifecycle
            .ensure_index("dQw4w9WgXcQ", || async {
                Err(VidaskError::Upstream("transcript service down".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VidaskError::Upstream(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_build_once() {
        let lifecycle = Arc::new(IndexLifecycle::new(Arc::new(MemoryArtifactStore::new())));
        let builds = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let lifecycle = lifecycle.clone();
            let builds = builds.clone();
            handles.push(tokio::spawn(async move {
                lifecycle
                    .ensure_index("dQw4w9WgXcQ", || async move {
                        builds.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(built_index("test-model"))
                    })
                    .await
                    .map(|ensured| ensured.reused)
            }));
        }

        let mut reused = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                reused += 1;
            }
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(reused, 3);
        assert!(lifecycle.key_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_mismatch_on_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(dir.path()));

        built_index("old-model")
            .save(store.as_ref(), "video_dQw4w9WgXcQ")
            .await
            .unwrap();

        let lifecycle = IndexLifecycle::new(store).with_expected_embedding("new-model", 2);
        let err = lifecycle
            .ensure_index("dQw4w9WgXcQ", || async { Ok(built_index("new-model")) })
            .await
            .unwrap_err();
        assert!(matches!(err, VidaskError::ModelMismatch { .. }));
    }

    #[tokio::test]
    async fn test_dimension_checked_on_load() {
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
        built_index("test-model")
            .save(store.as_ref(), "video_index")
            .await
            .unwrap();

        let lifecycle = IndexLifecycle::new(store).with_expected_embedding("test-model", 3);
        let err = lifecycle.load("video_index").await.unwrap_err();
        assert!(matches!(err, VidaskError::DimensionMismatch { expected: 2, actual: 3 }));
        assert_eq!(err.to_string(), "Dimension mismatch: index expects 2, got 3");
    }
}
