//! Provider clients. Each one owns a preconfigured `reqwest::Client`.

pub mod gemini_service;
pub mod ollama_service;
pub mod open_ai_service;

use std::time::Instant;

use tracing::error;

use crate::error_handler::{HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet};

/// Turns a non-2xx response into a [`ProviderError`], logging status and a body snippet.
pub(crate) async fn status_error(
    provider: Provider,
    resp: reqwest::Response,
    model: &str,
    started: Instant,
) -> ProviderError {
    let status = resp.status();
    let url = resp.url().to_string();
    let text = resp.text().await.unwrap_or_default();
    let snippet = make_snippet(&text);

    error!(
        target: "ai_llm_service::http",
        %provider,
        %status,
        %url,
        %snippet,
        model,
        latency_ms = started.elapsed().as_millis(),
        "provider returned non-success status"
    );

    ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url,
            snippet,
        }),
    )
}

/// Fails when the embedding answer does not carry one vector per input.
pub(crate) fn ensure_batch_len(
    provider: Provider,
    got: usize,
    want: usize,
) -> Result<(), ProviderError> {
    if got == want {
        Ok(())
    } else {
        Err(ProviderError::new(
            provider,
            ProviderErrorKind::Decode(format!("expected {want} embeddings, got {got}")),
        ))
    }
}
