//! SharePoint search client for the SEFAZ-SP legislation portal.

use std::{future::Future, pin::Pin, time::Duration, time::Instant};

use ai_llm_service::error_handler::make_snippet;
use pulldown_cmark_escape::escape_html;
use reqwest::{StatusCode, header};
use tracing::{debug, info, instrument, warn};

use crate::config::PortalConfig;
use crate::errors::{CorpusError, Result};

/// SharePoint client-query body with `@@...@@` placeholders.
const SEARCH_QUERY_TEMPLATE: &str = include_str!("search_query.xml");

/// Boxed future returned by [`LegislationSource::search`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Where raw search responses come from. Implemented by [`SefazPortal`] and by test doubles.
pub trait LegislationSource: Send + Sync {
    /// Runs one search for `keyword` and returns the raw response body.
    fn search<'a>(&'a self, keyword: &'a str) -> SourceFuture<'a>;
}

/// Escapes markup characters for element text and double-quoted attributes.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // writing into a String cannot fail
    let _ = escape_html(&mut out, s);
    out
}

/// Fills the search template for `keyword`. Only `QueryText` and `ResultsUrl`
/// depend on the keyword; the row limit comes from configuration.
///
/// Placeholders are resolved in one pass over the template, so substituted
/// text is never scanned again.
pub fn query_body(cfg: &PortalConfig, keyword: &str) -> String {
    let term = xml_escape(keyword);
    let results_url = xml_escape(&format!("{}#k={keyword}", cfg.search_page));
    let row_limit = cfg.row_limit.to_string();
    let total_rows_min = (cfg.row_limit + 1).to_string();

    let mut out = String::with_capacity(SEARCH_QUERY_TEMPLATE.len() + 2 * term.len());
    let mut rest = SEARCH_QUERY_TEMPLATE;
    while let Some(start) = rest.find("@@") {
        let after = &rest[start + 2..];
        let Some(len) = after.find("@@") else { break };
        let value = match &after[..len] {
            "TERM" => term.as_str(),
            "RESULTS_URL" => results_url.as_str(),
            "ROW_LIMIT" => row_limit.as_str(),
            "TOTAL_ROWS_MIN" => total_rows_min.as_str(),
            _ => {
                out.push_str(&rest[..start + 2]);
                rest = after;
                continue;
            }
        };
        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &after[len + 2..];
    }
    out.push_str(rest);
    out
}

/// HTTP client for the portal's `ProcessQuery` endpoint.
#[derive(Debug)]
pub struct SefazPortal {
    client: reqwest::Client,
    cfg: PortalConfig,
}

impl SefazPortal {
    /// Builds the client with the browser-like headers the portal expects.
    ///
    /// # Errors
    /// [`CorpusError::InvalidConfig`] when a configured header value is not valid ASCII.
    pub fn new(cfg: PortalConfig) -> Result<Self> {
        let header_value = |name: &str, v: &str| {
            header::HeaderValue::from_str(v)
                .map_err(|e| CorpusError::InvalidConfig(format!("invalid {name} header: {e}")))
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header_value("User-Agent", &cfg.user_agent)?);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(
            "X-Requested-With",
            header::HeaderValue::from_static("XMLHttpRequest"),
        );
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/xml"));
        headers.insert(
            "X-RequestDigest",
            header_value("X-RequestDigest", &cfg.request_digest)?,
        );
        headers.insert("Sec-Fetch-Dest", header::HeaderValue::from_static("empty"));
        headers.insert("Sec-Fetch-Mode", header::HeaderValue::from_static("cors"));
        headers.insert("Sec-Fetch-Site", header::HeaderValue::from_static("same-origin"));
        headers.insert(header::REFERER, header_value("Referer", &cfg.search_page)?);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        info!(
            target: "legis_corpus::portal",
            url = %cfg.url,
            row_limit = cfg.row_limit,
            timeout_secs = cfg.timeout_secs,
            "SefazPortal initialized"
        );
        Ok(Self { client, cfg })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.cfg
    }

    #[instrument(skip_all, fields(keyword = %keyword))]
    async fn post_query(&self, keyword: &str) -> Result<String> {
        let started = Instant::now();
        let body = query_body(&self.cfg, keyword);

        debug!(target: "legis_corpus::portal", body_len = body.len(), "POST {}", self.cfg.url);
        let resp = self.client.post(&self.cfg.url).body(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let url = resp.url().to_string();
            let text = resp.text().await.unwrap_or_default();
            warn!(
                target: "legis_corpus::portal",
                %status,
                latency_ms = started.elapsed().as_millis(),
                "portal returned non-success status"
            );
            if matches!(status, StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED) {
                return Err(CorpusError::StaleCredential { status, url });
            }
            return Err(CorpusError::Upstream {
                status: Some(status),
                url,
                reason: make_snippet(&text),
            });
        }

        let text = resp.text().await?;
        info!(
            target: "legis_corpus::portal",
            latency_ms = started.elapsed().as_millis(),
            bytes = text.len(),
            "portal search completed"
        );
        Ok(text)
    }
}

impl LegislationSource for SefazPortal {
    fn search<'a>(&'a self, keyword: &'a str) -> SourceFuture<'a> {
        Box::pin(self.post_query(keyword))
    }
}
