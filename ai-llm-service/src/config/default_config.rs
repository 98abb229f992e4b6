//! Default LLM configs loaded from environment variables.
//!
//! Three roles are resolved here:
//!
//! - **Fast**      → structured extraction (search terms)
//! - **Slow**      → long-form analysis; falls back to fast when unset
//! - **Embedding** → passage and query vectorization
//!
//! # Environment variables
//!
//! Generation:
//! - `LLM_KIND`         = `gemini` (default), `openai`, `ollama`
//! - `LLM_MODEL_FAST`   = fast model (default `gemini-2.5-flash`)
//! - `LLM_MODEL_SLOW`   = optional slow model
//! - `LLM_ENDPOINT`     = optional base URL (provider default otherwise)
//! - `LLM_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY`
//! - `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS`
//!
//! Embedding:
//! - `EMBEDDING_KIND`     = `ollama` (default), `openai`, `gemini`
//! - `EMBEDDING_MODEL`    = default `all-minilm`
//! - `EMBEDDING_ENDPOINT` or `OLLAMA_URL` / `OLLAMA_PORT`
//! - `EMBEDDING_API_KEY`

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_u32, env_opt_u64, validate_http_endpoint,
    },
};

const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `None`
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is not a valid port.
fn ollama_endpoint() -> Result<Option<String>, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        return Ok(Some(url));
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(Some(format!("http://localhost:{}", port.trim())));
    }
    Ok(None)
}

/// API key for a generation provider: `LLM_API_KEY` first, then the vendor variable.
fn generation_api_key(provider: LlmProvider) -> Option<String> {
    env_opt("LLM_API_KEY").or_else(|| match provider {
        LlmProvider::Gemini => env_opt("GEMINI_API_KEY").or_else(|| env_opt("GOOGLE_API_KEY")),
        LlmProvider::OpenAI => env_opt("OPENAI_API_KEY"),
        LlmProvider::Ollama => None,
    })
}

fn provider_from_env(var: &'static str, default: LlmProvider) -> Result<LlmProvider, AiLlmError> {
    match env_opt(var) {
        Some(v) => v.parse(),
        None => Ok(default),
    }
}

fn generation_endpoint(provider: LlmProvider) -> Result<String, AiLlmError> {
    let endpoint = match env_opt("LLM_ENDPOINT") {
        Some(e) => e,
        None if provider == LlmProvider::Ollama => {
            ollama_endpoint()?.unwrap_or_else(|| provider.default_endpoint().to_string())
        }
        None => provider.default_endpoint().to_string(),
    };
    validate_http_endpoint("LLM_ENDPOINT", &endpoint)?;
    Ok(endpoint)
}

/// Constructs the **fast** generation profile (structured term extraction).
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(120)`
pub fn config_generation_fast() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env("LLM_KIND", LlmProvider::Gemini)?;
    let model = env_opt("LLM_MODEL_FAST").unwrap_or_else(|| DEFAULT_FAST_MODEL.to_string());

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint: generation_endpoint(provider)?,
        api_key: generation_api_key(provider),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(120)),
    })
}

/// Constructs the **slow** generation profile (final analysis).
///
/// Returns `Ok(None)` when `LLM_MODEL_SLOW` is unset so callers fall back to fast.
pub fn config_generation_slow() -> Result<Option<LlmModelConfig>, AiLlmError> {
    let Some(model) = env_opt("LLM_MODEL_SLOW") else {
        return Ok(None);
    };
    let fast = config_generation_fast()?;
    Ok(Some(LlmModelConfig {
        model,
        temperature: Some(0.4),
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(300)),
        ..fast
    }))
}

/// Constructs the **embedding** profile.
///
/// # Defaults
/// - provider `ollama`, model `all-minilm`
/// - `temperature = Some(0.0)`
/// - `timeout_secs = Some(60)`
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env("EMBEDDING_KIND", LlmProvider::Ollama)?;
    let model = env_opt("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

    let endpoint = match env_opt("EMBEDDING_ENDPOINT") {
        Some(e) => e,
        None if provider == LlmProvider::Ollama => {
            ollama_endpoint()?.unwrap_or_else(|| provider.default_endpoint().to_string())
        }
        None => provider.default_endpoint().to_string(),
    };
    validate_http_endpoint("EMBEDDING_ENDPOINT", &endpoint)?;

    let api_key = env_opt("EMBEDDING_API_KEY").or_else(|| generation_api_key(provider));

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(60),
    })
}
