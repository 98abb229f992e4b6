//! Typed error for the fiscal-analyst crate.

use std::path::PathBuf;

use ai_llm_service::AiLlmError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AnalystError {
    /// Source document does not exist.
    #[error("input document not found: {0}")]
    InputNotFound(PathBuf),

    /// Errors from the underlying LLM service.
    #[error("LLM error: {0}")]
    Llm(#[from] AiLlmError),

    /// Model output could not be parsed into the expected shape.
    #[error("malformed LLM response: {reason}; excerpt: {excerpt}")]
    MalformedResponse { reason: String, excerpt: String },

    /// A required term came back empty after trimming.
    #[error("LLM returned an empty `{0}`")]
    EmptyTerm(&'static str),

    /// Report could not be written.
    #[error("failed to render report to {path}: {reason}")]
    Render { path: PathBuf, reason: String },

    /// Filesystem errors while reading the input.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
