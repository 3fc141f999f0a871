//! Filesystem artifact store.
//!
//! Each artifact `N` is two files in the index directory: `N.vectors` and
//! `N.meta.json`. Both are written to temp files in the same directory and
//! renamed into place, metadata first. A crash between the two renames
//! leaves new metadata beside old vectors; decoding rejects that pair because
//! the metadata records the digest of the vectors it was saved with.

use super::artifact::{validate_artifact_name, ArtifactBlobs, ArtifactStore};
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const VECTORS_SUFFIX: &str = ".vectors";
const METADATA_SUFFIX: &str = ".meta.json";

/// Artifact store backed by a directory of files.
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn vectors_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, VECTORS_SUFFIX))
    }

    fn metadata_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, METADATA_SUFFIX))
    }

    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| VidaskError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        validate_artifact_name(name)?;
        Ok(self.vectors_path(name).is_file() && self.metadata_path(name).is_file())
    }

    #[instrument(skip(self, blobs), fields(dir = %self.dir.display()))]
    async fn put(&self, name: &str, blobs: &ArtifactBlobs) -> Result<()> {
        validate_artifact_name(name)?;
        std::fs::create_dir_all(&self.dir)?;

        self.write_atomic(&self.metadata_path(name), &blobs.metadata)?;
        self.write_atomic(&self.vectors_path(name), &blobs.vectors)?;

        info!("Saved index artifact {} to {:?}", name, self.dir);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<ArtifactBlobs> {
        validate_artifact_name(name)?;

        let vectors_path = self.vectors_path(name);
        let metadata_path = self.metadata_path(name);

        if !vectors_path.is_file() {
            return Err(VidaskError::NotFound(format!(
                "Index vectors missing for '{}' ({})",
                name,
                vectors_path.display()
            )));
        }
        if !metadata_path.is_file() {
            return Err(VidaskError::NotFound(format!(
                "Index metadata missing for '{}' ({})",
                name,
                metadata_path.display()
            )));
        }

        let vectors = std::fs::read(&vectors_path)?;
        let metadata = std::fs::read(&metadata_path)?;
        debug!("Read artifact {} ({} + {} bytes)", name, vectors.len(), metadata.len());

        Ok(ArtifactBlobs { vectors, metadata })
    }

    async fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().to_string();
                file_name.strip_suffix(VECTORS_SUFFIX).map(str::to_string)
            })
            .filter(|name| self.metadata_path(name).is_file())
            .collect();

        names.sort();
        Ok(names)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
