//! Pipeline-wide error and its coarse classification.

use std::fmt;

use ai_llm_service::AiLlmError;
use fiscal_analyst::AnalystError;
use legis_corpus::CorpusError;
use legis_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Analyst(#[from] AnalystError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure classes reported to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InputNotFound,
    UpstreamRequestFailed,
    MalformedResponse,
    IndexNotFound,
    RenderFailure,
    Llm,
    Config,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InputNotFound => "input not found",
            ErrorKind::UpstreamRequestFailed => "upstream request failed",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::IndexNotFound => "index not found",
            ErrorKind::RenderFailure => "render failure",
            ErrorKind::Llm => "llm",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Analyst(e) => analyst_kind(e),
            PipelineError::Corpus(e) => corpus_kind(e),
            PipelineError::Store(e) => store_kind(e),
            PipelineError::Llm(_) => ErrorKind::Llm,
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Io(_) => ErrorKind::Io,
        }
    }
}

fn analyst_kind(e: &AnalystError) -> ErrorKind {
    match e {
        AnalystError::InputNotFound(_) => ErrorKind::InputNotFound,
        AnalystError::MalformedResponse { .. } | AnalystError::EmptyTerm(_) => {
            ErrorKind::MalformedResponse
        }
        AnalystError::Render { .. } => ErrorKind::RenderFailure,
        AnalystError::Llm(_) => ErrorKind::Llm,
        _ => ErrorKind::Io,
    }
}

fn corpus_kind(e: &CorpusError) -> ErrorKind {
    match e {
        CorpusError::StaleCredential { .. } | CorpusError::Upstream { .. } => {
            ErrorKind::UpstreamRequestFailed
        }
        CorpusError::MalformedPayload { .. } => ErrorKind::MalformedResponse,
        CorpusError::InvalidConfig(_) => ErrorKind::Config,
        CorpusError::Store(s) => store_kind(s),
        _ => ErrorKind::Io,
    }
}

fn store_kind(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::NotFound { .. } => ErrorKind::IndexNotFound,
        StoreError::Embedding(_) => ErrorKind::Llm,
        _ => ErrorKind::Io,
    }
}
