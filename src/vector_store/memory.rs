//! In-memory artifact store.
//!
//! Useful for testing and for short-lived servers that should not touch disk.

use super::artifact::{validate_artifact_name, ArtifactBlobs, ArtifactStore};
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory artifact store.
pub struct MemoryArtifactStore {
    artifacts: RwLock<BTreeMap<String, ArtifactBlobs>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            artifacts: RwLock::new(BTreeMap::new()),
        }
    }

    fn poisoned<T>(e: std::sync::PoisonError<T>) -> VidaskError {
        VidaskError::Config(format!("Failed to acquire lock: {}", e))
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        validate_artifact_name(name)?;
        let artifacts = self.artifacts.read().map_err(Self::poisoned)?;
        Ok(artifacts.contains_key(name))
    }

    async fn put(&self, name: &str, blobs: &ArtifactBlobs) -> Result<()> {
        validate_artifact_name(name)?;
        let mut artifacts = self.artifacts.write().map_err(Self::poisoned)?;
        artifacts.insert(name.to_string(), blobs.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<ArtifactBlobs> {
        validate_artifact_name(name)?;
        let artifacts = self.artifacts.read().map_err(Self::poisoned)?;
        artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| VidaskError::NotFound(format!("No index artifact named '{}'", name)))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let artifacts = self.artifacts.read().map_err(Self::poisoned)?;
        Ok(artifacts.keys().cloned().collect())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_artifact_store() {
        let store = MemoryArtifactStore::new();
        let blobs = ArtifactBlobs {
            vectors: vec![1, 2, 3],
            metadata: b"{}".to_vec(),
        };

        store.put("video_b", &blobs).await.unwrap();
        store.put("video_a", &blobs).await.unwrap();

        assert!(store.exists("video_a").await.unwrap());
        assert_eq!(store.get("video_b").await.unwrap(), blobs);
        assert_eq!(
            store.list().await.unwrap(),
            vec!["video_a".to_string(), "video_b".to_string()]
        );
        assert!(matches!(store.get("video_c").await, Err(VidaskError::NotFound(_))));
    }
}
