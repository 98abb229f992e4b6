//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Top-level error for legis-store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Index or metadata file is absent; the corpus was never built for this keyword.
    #[error("index not found: {index} / {metadata} (build the corpus for this keyword first)")]
    NotFound { index: PathBuf, metadata: PathBuf },

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Vector dimensionality differs from the index dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Number of vectors differs from the number of metadata entries.
    #[error("count mismatch: {vectors} vectors vs {passages} metadata entries")]
    CountMismatch { vectors: usize, passages: usize },

    /// A metadata entry's id does not equal its list position.
    #[error("metadata id {id} found at position {position}")]
    MisalignedId { position: usize, id: usize },

    /// Index file is truncated, has a bad header or an unsupported version.
    #[error("corrupt index file {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: String },

    /// Index cannot be created with the given parameters.
    #[error("invalid index: {0}")]
    InvalidIndex(&'static str),

    /// Embedding backend failed.
    #[error("embedding error: {0}")]
    Embedding(String),
}

impl From<ai_llm_service::AiLlmError> for StoreError {
    fn from(e: ai_llm_service::AiLlmError) -> Self {
        StoreError::Embedding(e.to_string())
    }
}
