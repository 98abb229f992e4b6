use crate::config::llm_provider::LlmProvider;

/// Configuration for one LLM model invocation profile.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "gemini-2.5-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com".to_string(),
///     api_key: Some("key".to_string()),
///     max_tokens: Some(2048),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert_eq!(cfg.timeout_secs(), 60);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gemini-2.5-flash"`, `"all-minilm"`).
    pub model: String,

    /// Base URL of the provider API.
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Effective request timeout, 60 seconds when unset.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(60)
    }

    /// Endpoint without surrounding whitespace or trailing slashes.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}

/// Shape of the text the model is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free-form text (markdown, prose).
    #[default]
    Text,
    /// A single JSON document; providers are asked to enforce it natively.
    Json,
}
