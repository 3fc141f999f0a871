//! Error types for vidask.

use thiserror::Error;

/// Library-level error type for vidask operations.
#[derive(Error, Debug)]
pub enum VidaskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transcripts are disabled for this video: {0}")]
    TranscriptDisabled(String),

    #[error("Corrupt index artifact: {0}")]
    Corrupt(String),

    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Arity mismatch: {vectors} vectors for {records} records")]
    ArityMismatch { vectors: usize, records: usize },

    #[error("Embedding model mismatch: index built with '{expected}', configured '{actual}'")]
    ModelMismatch { expected: String, actual: String },

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("No video has been processed yet. Process a video first.")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Coarse classification used at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    NotReady,
    Upstream,
    Structural,
    Internal,
}

impl VidaskError {
    /// Classify this error for callers that translate it (HTTP status, exit code).
    pub fn kind(&self) -> ErrorKind {
        match self {
            VidaskError::InvalidInput(_) => ErrorKind::InvalidInput,
            VidaskError::NotFound(_) | VidaskError::TranscriptDisabled(_) => ErrorKind::NotFound,
            VidaskError::NotReady => ErrorKind::NotReady,
            VidaskError::Upstream(_) | VidaskError::Http(_) => ErrorKind::Upstream,
            VidaskError::Corrupt(_)
            | VidaskError::DimensionMismatch { .. }
            | VidaskError::ArityMismatch { .. }
            | VidaskError::ModelMismatch { .. } => ErrorKind::Structural,
            VidaskError::Config(_)
            | VidaskError::Io(_)
            | VidaskError::Json(_)
            | VidaskError::TomlParse(_)
            | VidaskError::Database(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for vidask operations.
pub type Result<T> = std::result::Result<T, VidaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(VidaskError::NotReady.kind(), ErrorKind::NotReady);
        assert_eq!(
            VidaskError::InvalidInput("x".to_string()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            VidaskError::TranscriptDisabled("abc".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            VidaskError::DimensionMismatch { expected: 2, actual: 3 }.kind(),
            ErrorKind::Structural
        );
    }

    #[test]
    fn test_error_messages() {
        let err = VidaskError::ArityMismatch { vectors: 2, records: 3 };
        assert_eq!(err.to_string(), "Arity mismatch: 2 vectors for 3 records");
    }
}
