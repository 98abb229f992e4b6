//! Search-term extraction: document in, `{termo_curto, termo_completo}` out.

use ai_llm_service::error_handler::make_snippet;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::document::Document;
use crate::error::{AnalystError, Result};
use crate::llm::AnalystLlm;
use crate::prompt::{TERMS_SYSTEM, build_terms_prompt};

/// Two search terms for one document.
///
/// `short` names the index and drives the portal query; `phrase` is the retrieval query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerms {
    #[serde(rename = "termo_curto")]
    pub short: String,
    #[serde(rename = "termo_completo")]
    pub phrase: String,
}

#[derive(Deserialize)]
struct RawTerms {
    termo_curto: Option<String>,
    termo_completo: Option<String>,
}

/// Strictly parses a model answer. Only surrounding whitespace (and a markdown code
/// fence around the object) is tolerated.
///
/// # Errors
/// [`AnalystError::MalformedResponse`] when the answer is not a JSON object with string
/// fields; [`AnalystError::EmptyTerm`] when a field is missing or blank.
pub fn parse_terms(raw: &str) -> Result<SearchTerms> {
    let body = strip_json_fence(raw.trim());
    let parsed: RawTerms =
        serde_json::from_str(body).map_err(|e| AnalystError::MalformedResponse {
            reason: e.to_string(),
            excerpt: make_snippet(raw),
        })?;

    let short = parsed.termo_curto.unwrap_or_default().trim().to_string();
    let phrase = parsed.termo_completo.unwrap_or_default().trim().to_string();
    if short.is_empty() {
        return Err(AnalystError::EmptyTerm("termo_curto"));
    }
    if phrase.is_empty() {
        return Err(AnalystError::EmptyTerm("termo_completo"));
    }
    Ok(SearchTerms { short, phrase })
}

/// Asks the model for the two search terms of `doc`. No retry.
#[instrument(skip_all, fields(doc = %doc.path.display()))]
pub async fn extract_terms(
    llm: &dyn AnalystLlm,
    doc: &Document,
    max_doc_chars: usize,
) -> Result<SearchTerms> {
    let prompt = build_terms_prompt(&doc.text, max_doc_chars);
    let raw = llm.generate_json(TERMS_SYSTEM, &prompt).await?;
    let terms = parse_terms(&raw)?;

    info!(
        target: "fiscal_analyst::terms",
        short = %terms.short,
        phrase = %terms.phrase,
        "search terms extracted"
    );
    Ok(terms)
}

fn strip_json_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
