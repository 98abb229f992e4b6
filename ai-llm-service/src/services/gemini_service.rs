//! Google Gemini service (Generative Language API, `v1beta`).
//!
//! - `POST {endpoint}/v1beta/models/{model}:generateContent`
//! - `POST {endpoint}/v1beta/models/{model}:batchEmbedContents`
//!
//! The API key travels in the `x-goog-api-key` header. Structured output is
//! requested through `generationConfig.responseMimeType = "application/json"`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    config::{
        llm_model_config::{LlmModelConfig, ResponseFormat},
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind, is_http_endpoint},
    services::{ensure_batch_len, status_error},
};

/// Thin client for Gemini.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embed: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`].
    ///
    /// # Errors
    /// Same validation rules as the OpenAI client: provider, API key and endpoint.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey)
        })?;
        if !is_http_endpoint(&cfg.endpoint) {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            header::HeaderValue::from_str(api_key.trim()).map_err(|e| {
                ProviderError::new(
                    Provider::Gemini,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs()))
            .default_headers(headers)
            .build()?;

        let model_path = model_path(&cfg.model);
        let base = cfg.base_url();
        let url_generate = format!("{base}/v1beta/{model_path}:generateContent");
        let url_embed = format!("{base}/v1beta/{model_path}:batchEmbedContents");

        info!(
            target: "ai_llm_service::gemini",
            model = %cfg.model,
            timeout_secs = cfg.timeout_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embed,
        })
    }

    /// Single `generateContent` call; returns the concatenated text parts of the first candidate.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        format: ResponseFormat,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt, system, format);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(Provider::Gemini, resp, &self.cfg.model, started)
                .await
                .into());
        }

        let out: GenerateContentResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts[].text`"
                )),
            )
        })?;

        let text = out.first_text().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyChoices)
        })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            out_len = text.len(),
            "generateContent completed"
        );
        Ok(text)
    }

    /// Embeds all `inputs` with one `batchEmbedContents` call.
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let started = Instant::now();
        let model = model_path(&self.cfg.model);
        let body = BatchEmbedRequest {
            requests: inputs
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &model,
                    content: Content::user_text(text),
                })
                .collect(),
        };

        debug!("POST {}", self.url_embed);
        let resp = self.client.post(&self.url_embed).json(&body).send().await?;

        if !resp.status().is_success() {
            return Err(status_error(Provider::Gemini, resp, &self.cfg.model, started)
                .await
                .into());
        }

        let out: BatchEmbedResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `embeddings[].values`")),
            )
        })?;

        ensure_batch_len(Provider::Gemini, out.embeddings.len(), inputs.len())?;
        Ok(out.embeddings.into_iter().map(|e| e.values).collect())
    }
}

/// `models/{name}` unless the caller already passed the prefixed form.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(
        cfg: &LlmModelConfig,
        prompt: &'a str,
        system: Option<&'a str>,
        format: ResponseFormat,
    ) -> Self {
        Self {
            contents: vec![Content::user_text(prompt)],
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part { text: s }],
            }),
            generation_config: GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_tokens,
                response_mime_type: (format == ResponseFormat::Json)
                    .then_some("application/json"),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user_text(text: &'a str) -> Self {
        Self {
            role: Some("user"),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_sets_mime_type() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: Some("k".into()),
            max_tokens: Some(1024),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: None,
        };
        let body = GenerateContentRequest::from_cfg(&cfg, "p", None, ResponseFormat::Json);
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(v["contents"][0]["parts"][0]["text"], "p");
        assert!(v.get("systemInstruction").is_none());
    }

    #[test]
    fn first_text_joins_parts_and_rejects_blank() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let out: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.first_text().as_deref(), Some("{\"a\":1}"));

        let blank: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(blank.first_text().is_none());
    }

    #[test]
    fn model_path_is_prefixed_once() {
        assert_eq!(model_path("text-embedding-004"), "models/text-embedding-004");
        assert_eq!(model_path("models/x"), "models/x");
    }
}
