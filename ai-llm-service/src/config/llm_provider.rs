use std::str::FromStr;

use crate::error_handler::{AiLlmError, ConfigError};

/// Backend used for large language model (LLM) inference and embeddings.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "Gemini".parse().unwrap();
/// assert_eq!(p, LlmProvider::Gemini);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Gemini (Generative Language API).
    Gemini,
    /// OpenAI-compatible chat/embeddings API.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
}

impl LlmProvider {
    /// Public endpoint used when no explicit endpoint is configured.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Ollama => "http://localhost:11434",
        }
    }

    /// Whether requests must carry an API key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }
}

impl FromStr for LlmProvider {
    type Err = AiLlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("ChatGPT".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" ollama ".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!("anthropic".parse::<LlmProvider>().is_err());
    }
}
