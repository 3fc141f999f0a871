//! Transcript chunking into overlapping word windows.
//!
//! Chunks are the retrievable unit of an index: each one carries its text,
//! its word range in the cleaned transcript and the video it came from.

mod window;

pub use window::WordWindowChunker;

use crate::error::{Result, VidaskError};
use serde::{Deserialize, Serialize};

/// A chunk of transcript text together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Sequential, 0-based id within one index build.
    pub chunk_id: usize,
    /// Text content of this chunk.
    pub text: String,
    /// First word offset into the cleaned transcript.
    pub word_start: usize,
    /// Word offset one past the last word.
    pub word_end: usize,
    /// Video this chunk belongs to.
    pub video_id: String,
    /// URL the transcript was fetched for.
    pub video_url: String,
}

impl ChunkRecord {
    /// Create a chunk record without provenance.
    pub fn new(chunk_id: usize, text: String, word_start: usize, word_end: usize) -> Self {
        Self {
            chunk_id,
            text,
            word_start,
            word_end,
            video_id: String::new(),
            video_url: String::new(),
        }
    }

    /// Stamp the record with the video it was chunked from.
    pub fn with_source(mut self, video_id: &str, video_url: &str) -> Self {
        self.video_id = video_id.to_string();
        self.video_url = video_url.to_string();
        self
    }

    /// Number of words covered by this chunk.
    pub fn word_count(&self) -> usize {
        self.word_end - self.word_start
    }
}

/// Configuration for word-window chunking.
///
/// Only [`ChunkingConfig::new`] builds one, so every value has a stride of at
/// least one word:
///
/// ```compile_fail
/// use vidask::chunking::ChunkingConfig;
///
/// let config = ChunkingConfig { chunk_size: 2, overlap: 2 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    /// Create a validated chunking configuration.
    ///
    /// `overlap` must be strictly smaller than `chunk_size`, otherwise the
    /// window would never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if overlap >= chunk_size {
            return Err(VidaskError::InvalidInput(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Words per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Words shared between adjacent chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of two adjacent chunks.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
