//! Shared LLM service with three profiles: `fast`, `slow`, and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - If the `slow` profile is not provided, it falls back to `fast`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_embedding, config_generation_fast};
//! use ai_llm_service::config::llm_model_config::ResponseFormat;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_generation_fast()?,
//!     None,
//!     config_embedding()?,
//! ));
//!
//! let json = svc.generate_fast("Return {\"ok\": true}", None, ResponseFormat::Json).await?;
//! let vectors = svc.embed_batch(&["Ferris".to_string()]).await?;
//! println!("{json} / dim = {}", vectors[0].len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{
        llm_model_config::{LlmModelConfig, ResponseFormat},
        llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    services::{
        gemini_service::GeminiService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// Shared service managing the **fast**, **slow**, and **embedding** profiles.
pub struct LlmServiceProfiles {
    fast: LlmModelConfig,
    slow: LlmModelConfig,
    embedding: LlmModelConfig,

    clients: RwLock<HashMap<ClientKey, Arc<Client>>>,
}

impl std::fmt::Debug for LlmServiceProfiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmServiceProfiles")
            .field("fast", &self.fast.model)
            .field("slow", &self.slow.model)
            .field("embedding", &self.embedding.model)
            .finish()
    }
}

/// One constructed provider client.
enum Client {
    Gemini(GeminiService),
    OpenAI(OpenAiService),
    Ollama(OllamaService),
}

impl Client {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::Gemini => Client::Gemini(GeminiService::new(cfg.clone())?),
            LlmProvider::OpenAI => Client::OpenAI(OpenAiService::new(cfg.clone())?),
            LlmProvider::Ollama => Client::Ollama(OllamaService::new(cfg.clone())?),
        })
    }

    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        format: ResponseFormat,
    ) -> Result<String, AiLlmError> {
        match self {
            Client::Gemini(c) => c.generate(prompt, system, format).await,
            Client::OpenAI(c) => c.generate(prompt, system, format).await,
            Client::Ollama(c) => c.generate(prompt, system, format).await,
        }
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        match self {
            Client::Gemini(c) => c.embed_batch(inputs).await,
            Client::OpenAI(c) => c.embed_batch(inputs).await,
            Client::Ollama(c) => c.embed_batch(inputs).await,
        }
    }
}

impl LlmServiceProfiles {
    /// Creates a new service with three profiles.
    ///
    /// - `fast`: required fast profile (structured extraction).
    /// - `slow_opt`: optional slow profile (analysis). If `None`, falls back to `fast`.
    /// - `embedding`: required embedding profile.
    ///
    /// Clients are built lazily on first use, so construction never touches the network.
    pub fn new(
        fast: LlmModelConfig,
        slow_opt: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
    ) -> Self {
        let slow = slow_opt.unwrap_or_else(|| fast.clone());
        Self {
            fast,
            slow,
            embedding,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Generates text using the **fast** profile.
    pub async fn generate_fast(
        &self,
        prompt: &str,
        system: Option<&str>,
        format: ResponseFormat,
    ) -> Result<String, AiLlmError> {
        self.client_for(&self.fast)
            .await?
            .generate(prompt, system, format)
            .await
    }

    /// Generates text using the **slow** profile.
    pub async fn generate_slow(
        &self,
        prompt: &str,
        system: Option<&str>,
        format: ResponseFormat,
    ) -> Result<String, AiLlmError> {
        self.client_for(&self.slow)
            .await?
            .generate(prompt, system, format)
            .await
    }

    /// Embeds a batch of texts using the **embedding** profile, one vector per input.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.client_for(&self.embedding)
            .await?
            .embed_batch(inputs)
            .await
    }

    /// Returns references to the current profiles `(fast, slow, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig, &LlmModelConfig) {
        (&self.fast, &self.slow, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn client_for(&self, cfg: &LlmModelConfig) -> Result<Arc<Client>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            return Ok(cli);
        }

        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(provider = ?cfg.provider, model = %cfg.model, "building provider client");
        let cli = Arc::new(Client::build(cfg)?);
        w.insert(key, Arc::clone(&cli));
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
