//! Unified error type for the legis-corpus crate.

use legis_store::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Errors produced while building a corpus.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CorpusError {
    // ── Portal ──────────────────────────────────────────────────────────────
    /// Portal refused the request (401/403). The `X-RequestDigest` session token expires quickly.
    #[error("portal rejected the request with HTTP {status} at {url}: the X-RequestDigest credential is probably stale")]
    StaleCredential { status: StatusCode, url: String },

    /// Portal unreachable or answered with another non-success status.
    #[error("portal request failed{}: {reason}", status_suffix(.status))]
    Upstream {
        status: Option<StatusCode>,
        url: String,
        reason: String,
    },

    /// Portal body did not contain a parseable `[ ... ]` payload.
    #[error("malformed portal payload: {reason}; excerpt: {excerpt}")]
    MalformedPayload { reason: String, excerpt: String },

    // ── Configuration ───────────────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Index / embeddings ──────────────────────────────────────────────────
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CorpusError {
    /// HTTP status reported by the portal, when there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CorpusError::StaleCredential { status, .. } => Some(*status),
            CorpusError::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// `true` for failures talking to the portal (as opposed to parsing or indexing).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CorpusError::StaleCredential { .. } | CorpusError::Upstream { .. }
        )
    }
}

impl From<reqwest::Error> for CorpusError {
    fn from(e: reqwest::Error) -> Self {
        CorpusError::Upstream {
            status: e.status(),
            url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: e.to_string(),
        }
    }
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}
