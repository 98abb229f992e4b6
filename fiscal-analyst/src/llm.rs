//! Model seam used by the analyst stages.

use std::{future::Future, pin::Pin};

use ai_llm_service::{LlmServiceProfiles, ResponseFormat};

use crate::error::Result;

/// Boxed future returned by [`AnalystLlm`] calls.
pub type LlmFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// The two request shapes the pipeline needs.
pub trait AnalystLlm: Send + Sync {
    /// Machine-parseable JSON answer (fast profile).
    fn generate_json<'a>(&'a self, system: &'a str, prompt: &'a str) -> LlmFuture<'a>;

    /// Free-form markdown answer (slow profile).
    fn generate_markdown<'a>(&'a self, system: &'a str, prompt: &'a str) -> LlmFuture<'a>;
}

impl AnalystLlm for LlmServiceProfiles {
    fn generate_json<'a>(&'a self, system: &'a str, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move {
            Ok(self
                .generate_fast(prompt, Some(system), ResponseFormat::Json)
                .await?)
        })
    }

    fn generate_markdown<'a>(&'a self, system: &'a str, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move {
            Ok(self
                .generate_slow(prompt, Some(system), ResponseFormat::Text)
                .await?)
        })
    }
}
