//! SQLite-backed artifact store.
//!
//! Keeps both halves of an artifact in one row so a save is a single
//! transaction.

use super::artifact::{validate_artifact_name, ArtifactBlobs, ArtifactStore};
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS artifacts (
    name TEXT PRIMARY KEY,
    vectors BLOB,
    metadata BLOB,
    created_at TEXT NOT NULL
);
"#;

/// SQLite artifact store.
pub struct SqliteArtifactStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteArtifactStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite artifact store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidaskError::Config(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl ArtifactStore for SqliteArtifactStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        validate_artifact_name(name)?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM artifacts WHERE name = ?1 AND vectors IS NOT NULL AND metadata IS NOT NULL",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self, blobs))]
    async fn put(&self, name: &str, blobs: &ArtifactBlobs) -> Result<()> {
        validate_artifact_name(name)?;
        let conn = self.lock()?;

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO artifacts (name, vectors, metadata, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, blobs.vectors, blobs.metadata, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        info!("Saved index artifact {}", name);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<ArtifactBlobs> {
        validate_artifact_name(name)?;
        let conn = self.lock()?;

        let row: Option<(Option<Vec<u8>>, Option<Vec<u8>>)> = conn
            .query_row(
                "SELECT vectors, metadata FROM artifacts WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            None => Err(VidaskError::NotFound(format!("No index artifact named '{}'", name))),
            Some((None, _)) => Err(VidaskError::NotFound(format!(
                "Index vectors missing for '{}'",
                name
            ))),
            Some((_, None)) => Err(VidaskError::NotFound(format!(
                "Index metadata missing for '{}'",
                name
            ))),
            Some((Some(vectors), Some(metadata))) => Ok(ArtifactBlobs { vectors, metadata }),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM artifacts WHERE vectors IS NOT NULL AND metadata IS NOT NULL ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let names = rows.collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}
