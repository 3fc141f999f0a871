//! Named index artifacts: a vector blob and a metadata blob stored as a pair.
//!
//! The vector blob is little-endian binary:
//! magic `VDXV`, format version (u32), dimension (u32), count (u64), then
//! `count * dimension` f32 values. The metadata blob is JSON holding the
//! [`IndexManifest`] and the chunk records in vector order. The manifest
//! carries the SHA-256 of the vector blob, so halves from different saves are
//! never paired.

use super::{IndexEntry, VectorIndex};
use crate::chunking::ChunkRecord;
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 2;

const VECTOR_MAGIC: &[u8; 4] = b"VDXV";
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Description of a persisted index, stored alongside its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Embedding model that produced the vectors.
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 of the vector blob saved together with this manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectors_sha256: Option<String>,
}

impl IndexManifest {
    pub fn new(embedding_model: &str, dimension: usize, chunk_count: usize) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            embedding_model: embedding_model.to_string(),
            dimension,
            chunk_count,
            created_at: Utc::now(),
            vectors_sha256: None,
        }
    }
}

/// The two halves of a persisted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBlobs {
    pub vectors: Vec<u8>,
    pub metadata: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct MetadataDocument {
    manifest: IndexManifest,
    records: Vec<ChunkRecord>,
}

/// Storage for named artifact pairs.
///
/// Implementations write both halves of a pair together and report a
/// missing half as `NotFound`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether both halves of `name` are present.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Store both halves under `name`, replacing any previous pair.
    async fn put(&self, name: &str, blobs: &ArtifactBlobs) -> Result<()>;

    /// Fetch both halves of `name`.
    async fn get(&self, name: &str) -> Result<ArtifactBlobs>;

    /// Names of all complete artifacts, sorted.
    async fn list(&self) -> Result<Vec<String>>;

    /// Short human-readable location (for logs and the CLI).
    fn location(&self) -> String;
}

/// Reject names that are empty or unsafe as file names.
pub fn validate_artifact_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(VidaskError::InvalidInput(format!(
            "Invalid index name: '{}'",
            name
        )))
    }
}

/// Serialize an index into its artifact pair.
pub fn encode_artifact(index: &VectorIndex) -> Result<ArtifactBlobs> {
    let dimension = u32::try_from(index.dimension()).map_err(|_| {
        VidaskError::InvalidInput(format!("Dimension {} too large", index.dimension()))
    })?;

    let mut vectors =
        Vec::with_capacity(HEADER_LEN + index.count() * index.dimension() * 4);
    vectors.extend_from_slice(VECTOR_MAGIC);
    vectors.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    vectors.extend_from_slice(&dimension.to_le_bytes());
    vectors.extend_from_slice(&(index.count() as u64).to_le_bytes());
    for entry in index.entries() {
        vectors.extend(entry.vector.iter().flat_map(|f| f.to_le_bytes()));
    }

    let mut manifest = index.manifest();
    manifest.vectors_sha256 = Some(vectors_digest(&vectors));

    let document = MetadataDocument {
        manifest,
        records: index.records().cloned().collect(),
    };
    let metadata = serde_json::to_vec(&document)?;

    Ok(ArtifactBlobs { vectors, metadata })
}

/// Rebuild an index from its artifact pair, checking the halves agree.
pub fn decode_artifact(name: &str, blobs: &ArtifactBlobs) -> Result<VectorIndex> {
    let corrupt = |reason: String| VidaskError::Corrupt(format!("{}: {}", name, reason));

    let bytes = &blobs.vectors;
    if bytes.len() < HEADER_LEN || &bytes[..4] != VECTOR_MAGIC {
        return Err(corrupt("vector blob has no valid header".to_string()));
    }

    let version = read_u32(&bytes[4..8]);
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported format version {}", version)));
    }
    let dimension = read_u32(&bytes[8..12]) as usize;
    let count = read_u64(&bytes[12..20]) as usize;

    let body = &bytes[HEADER_LEN..];
    let expected_len = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt("vector count overflows".to_string()))?;
    if body.len() != expected_len {
        return Err(corrupt(format!(
            "vector blob holds {} bytes, expected {}",
            body.len(),
            expected_len
        )));
    }

    let document: MetadataDocument = serde_json::from_slice(&blobs.metadata)
        .map_err(|e| corrupt(format!("metadata is unreadable: {}", e)))?;

    let digest = vectors_digest(bytes);
    if document.manifest.vectors_sha256.as_deref() != Some(digest.as_str()) {
        return Err(corrupt(
            "metadata and vector blob come from different saves".to_string(),
        ));
    }

    if document.records.len() != count {
        return Err(corrupt(format!(
            "{} vectors but {} metadata records",
            count,
            document.records.len()
        )));
    }
    if document.manifest.chunk_count != count || document.manifest.dimension != dimension {
        return Err(corrupt(format!(
            "manifest describes {} x {}, blob holds {} x {}",
            document.manifest.chunk_count, document.manifest.dimension, count, dimension
        )));
    }

    let entries = if dimension == 0 {
        document
            .records
            .into_iter()
            .map(|record| IndexEntry {
                vector: Vec::new(),
                record,
            })
            .collect()
    } else {
        body.chunks_exact(dimension * 4)
            .zip(document.records)
            .map(|(raw, record)| IndexEntry {
                vector: raw
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect(),
                record,
            })
            .collect()
    };

    Ok(VectorIndex::from_entries(
        document.manifest.embedding_model,
        dimension,
        entries,
    ))
}

fn vectors_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new("test-model", 3);
        let records = (0..4)
            .map(|i| {
                ChunkRecord::new(i, format!("chunk {}", i), i * 2, i * 2 + 3)
                    .with_source("abcdefghijk", "https://youtu.be/abcdefghijk")
            })
            .collect();
        index
            .add(
                vec![
                    vec![1.0, 2.0, 3.0],
                    vec![0.0, 1.0, 0.0],
                    vec![-1.0, 0.5, 0.25],
                    vec![0.3, 0.3, 0.9],
                ],
                records,
            )
            .unwrap();
        index
    }

    #[test]
    fn test_round_trip_preserves_index() {
        let index = sample_index();
        let blobs = encode_artifact(&index).unwrap();
        let restored = decode_artifact("video_x", &blobs).unwrap();

        assert_eq!(restored, index);
        assert_eq!(
            restored.search(&[0.2, 0.9, 0.1], 4).unwrap(),
            index.search(&[0.2, 0.9, 0.1], 4).unwrap()
        );
    }

    #[test]
    fn test_empty_index_round_trip() {
        let index = VectorIndex::new("test-model", 3);
        let blobs = encode_artifact(&index).unwrap();
        let restored = decode_artifact("empty", &blobs).unwrap();
        assert_eq!(restored.count(), 0);
        assert_eq!(restored.dimension(), 3);
    }

    #[test]
    fn test_mismatched_counts_are_corrupt() {
        let mut blobs = encode_artifact(&sample_index()).unwrap();

        let mut document: MetadataDocument = serde_json::from_slice(&blobs.metadata).unwrap();
        document.records.pop();
        blobs.metadata = serde_json::to_vec(&document).unwrap();

        assert!(matches!(
            decode_artifact("video_x", &blobs),
            Err(VidaskError::Corrupt(_))
        ));
    }

    #[test]
    fn test_truncated_vectors_are_corrupt() {
        let mut blobs = encode_artifact(&sample_index()).unwrap();
        blobs.vectors.truncate(blobs.vectors.len() - 4);
        assert!(matches!(
            decode_artifact("video_x", &blobs),
            Err(VidaskError::Corrupt(_))
        ));

        blobs.vectors = b"nope".to_vec();
        assert!(matches!(
            decode_artifact("video_x", &blobs),
            Err(VidaskError::Corrupt(_))
        ));
    }

    #[test]
    fn test_halves_from_different_saves_are_corrupt() {
        let first = encode_artifact(&sample_index()).unwrap();

        let mut changed = VectorIndex::new("test-model", 3);
        changed
            .add(
                vec![
                    vec![0.0, 0.0, 1.0],
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0],
                    vec![1.0, 1.0, 1.0],
                ],
                sample_index().records().cloned().collect(),
            )
            .unwrap();
        let second = encode_artifact(&changed).unwrap();

        // Same counts and dimension, so only the digest tells them apart.
        let mixed = ArtifactBlobs {
            vectors: first.vectors.clone(),
            metadata: second.metadata.clone(),
        };
        let err = decode_artifact("video_x", &mixed).unwrap_err();
        assert!(matches!(err, VidaskError::Corrupt(_)));
        assert!(err.to_string().contains("different saves"));

        assert!(decode_artifact("video_x", &first).is_ok());
        assert!(decode_artifact("video_x", &second).is_ok());
    }

    #[test]
    fn test_unreadable_metadata_is_corrupt() {
        let mut blobs = encode_artifact(&sample_index()).unwrap();
        blobs.metadata = b"{not json".to_vec();
        assert!(matches!(
            decode_artifact("video_x", &blobs),
            Err(VidaskError::Corrupt(_))
        ));
    }

    #[test]
    fn test_validate_artifact_name() {
        assert!(validate_artifact_name("video_dQw4w9WgXcQ").is_ok());
        assert!(validate_artifact_name("video_index").is_ok());
        assert!(validate_artifact_name("").is_err());
        assert!(validate_artifact_name("../etc/passwd").is_err());
        assert!(validate_artifact_name(".hidden").is_err());
        assert!(validate_artifact_name("a b").is_err());
    }
}
