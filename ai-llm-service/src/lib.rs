//! Shared LLM service: Gemini, OpenAI and Ollama clients behind fast/slow/embedding profiles,
//! unified errors, env-driven defaults and the workspace logging layer.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{
    llm_model_config::{LlmModelConfig, ResponseFormat},
    llm_provider::LlmProvider,
};
pub use error_handler::AiLlmError;
pub use service_profiles::LlmServiceProfiles;
