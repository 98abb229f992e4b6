//! Embedding abstraction.

use std::{future::Future, pin::Pin};

use crate::errors::{Result, StoreError};

pub mod service;

/// Boxed future returned by [`EmbeddingsProvider::embed_batch`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Implementations return exactly one vector per input, in input order.
/// Async because real providers (Ollama, OpenAI, Gemini) perform HTTP requests.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a>;
}

/// Embeds a single text through a batch provider.
pub async fn embed_one(provider: &dyn EmbeddingsProvider, text: &str) -> Result<Vec<f32>> {
    let batch = [text.to_string()];
    provider
        .embed_batch(&batch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Embedding("provider returned no vector".into()))
}
