//! The single active index served to questions.

use crate::error::{Result, VidaskError};
use crate::vector_store::VectorIndex;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::info;

/// An index currently selected for answering questions.
#[derive(Debug)]
pub struct ActiveIndex {
    /// Artifact name the index was loaded from or saved to.
    pub name: String,
    /// Video the index was built for, when known.
    pub video_id: Option<String>,
    pub index: VectorIndex,
}

/// Snapshot of service readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub index_loaded: bool,
    pub current_video_id: Option<String>,
    pub index_name: Option<String>,
    pub num_chunks: usize,
}

/// Holds the active index behind an atomically swapped pointer.
///
/// Readers take an `Arc` and release the lock before using it, so a swap
/// never disturbs a query already in flight.
#[derive(Debug, Default)]
pub struct Session {
    active: RwLock<Option<Arc<ActiveIndex>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active index, returning the previous one.
    pub fn swap(&self, next: ActiveIndex) -> Result<Option<Arc<ActiveIndex>>> {
        let next = Arc::new(next);
        let mut active = self
            .active
            .write()
            .map_err(|e| VidaskError::Config(format!("Failed to acquire lock: {}", e)))?;

        info!("Active index is now {} ({} chunks)", next.name, next.index.count());
        Ok(active.replace(next))
    }

    /// The active index, if any.
    pub fn current(&self) -> Result<Option<Arc<ActiveIndex>>> {
        let active = self
            .active
            .read()
            .map_err(|e| VidaskError::Config(format!("Failed to acquire lock: {}", e)))?;
        Ok(active.clone())
    }

    /// The active index, or `NotReady` when nothing has been loaded yet.
    pub fn require(&self) -> Result<Arc<ActiveIndex>> {
        self.current()?.ok_or(VidaskError::NotReady)
    }

    pub fn clear(&self) -> Result<()> {
        let mut active = self
            .active
            .write()
            .map_err(|e| VidaskError::Config(format!("Failed to acquire lock: {}", e)))?;
        *active = None;
        Ok(())
    }

    pub fn health(&self) -> Result<HealthReport> {
        Ok(match self.current()? {
            Some(active) => HealthReport {
                status: "healthy".to_string(),
                index_loaded: true,
                current_video_id: active.video_id.clone(),
                index_name: Some(active.name.clone()),
                num_chunks: active.index.count(),
            },
            None => HealthReport {
                status: "not_ready".to_string(),
                index_loaded: false,
                current_video_id: None,
                index_name: None,
                num_chunks: 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkRecord;

    fn active(name: &str, chunks: usize) -> ActiveIndex {
        let mut index = VectorIndex::new("test-model", 1);
        index
            .add(
                vec![vec![1.0]; chunks],
                (0..chunks)
                    .map(|i| ChunkRecord::new(i, format!("chunk {}", i), i, i + 1))
                    .collect(),
            )
            .unwrap();
        ActiveIndex {
            name: name.to_string(),
            video_id: name.strip_prefix("video_").map(str::to_string),
            index,
        }
    }

    #[test]
    fn test_empty_session_is_not_ready() {
        let session = Session::new();
        assert!(session.current().unwrap().is_none());
        assert!(matches!(session.require(), Err(VidaskError::NotReady)));

        let health = session.health().unwrap();
        assert_eq!(health.status, "not_ready");
        assert!(!health.index_loaded);
        assert_eq!(health.num_chunks, 0);
    }

    #[test]
    fn test_swap_keeps_readers_on_old_index() {
        let session = Session::new();
        assert!(session.swap(active("video_first", 2)).unwrap().is_none());

        let held = session.require().unwrap();
        let previous = session.swap(active("video_second", 3)).unwrap().unwrap();

        assert_eq!(held.name, "video_first");
        assert_eq!(held.index.count(), 2);
        assert!(Arc::ptr_eq(&held, &previous));

        let health = session.health().unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.current_video_id.as_deref(), Some("second"));
        assert_eq!(health.index_name.as_deref(), Some("video_second"));
        assert_eq!(health.num_chunks, 3);

        session.clear().unwrap();
        assert!(session.current().unwrap().is_none());
    }
}
