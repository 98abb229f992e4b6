//! Embedding provider backed by the shared [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use tracing::debug;

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::StoreError;

/// Uses the embedding profile of an explicitly passed service handle.
#[derive(Clone, Debug)]
pub struct ServiceEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected dimension; `None` accepts whatever the model returns.
    dim: Option<usize>,
}

impl ServiceEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for ServiceEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(async move {
            let vectors = self.svc.embed_batch(texts).await?;

            if vectors.len() != texts.len() {
                return Err(StoreError::Embedding(format!(
                    "expected {} vectors, got {}",
                    texts.len(),
                    vectors.len()
                )));
            }
            if let Some(want) = self.dim {
                if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
                    return Err(StoreError::VectorSizeMismatch {
                        got: bad.len(),
                        want,
                    });
                }
            }

            debug!(
                target: "legis_store::embed",
                batch = texts.len(),
                dim = vectors.first().map(Vec::len).unwrap_or(0),
                "embedded batch"
            );
            Ok(vectors)
        })
    }
}
