//! Final analysis: prompt, shape validation and fallback.

use ai_llm_service::error_handler::make_snippet;
use tracing::{info, instrument, warn};

use crate::document::Document;
use crate::llm::AnalystLlm;
use crate::prompt::{ANALYSIS_SYSTEM, REPORT_SECTIONS, build_analysis_prompt};

/// Substituted when the model fails or answers in the wrong shape.
pub const FALLBACK_REPORT: &str = "# Erro de Análise\nAnálise final não pôde ser concluída.";

/// Markdown analysis of one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisReport {
    pub markdown: String,
    /// `true` when `markdown` is [`FALLBACK_REPORT`]; such reports are not rendered.
    pub fallback: bool,
}

impl AnalysisReport {
    pub fn fallback() -> Self {
        Self {
            markdown: FALLBACK_REPORT.to_string(),
            fallback: true,
        }
    }
}

/// `true` when the first non-blank line is a level-1 ATX heading (`# Title`).
///
/// ```
/// use fiscal_analyst::report::is_well_formed;
/// assert!(is_well_formed("\n# Análise\n## Resumo da NF-e"));
/// assert!(!is_well_formed("## Resumo"));
/// assert!(!is_well_formed("Aqui está a análise:\n# Título"));
/// ```
pub fn is_well_formed(markdown: &str) -> bool {
    let Some(first) = markdown.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return false;
    };
    match first.strip_prefix('#') {
        Some(rest) => rest.starts_with(' ') && !rest.trim().is_empty(),
        None => false,
    }
}

/// Section headings from [`REPORT_SECTIONS`] that the markdown does not mention.
pub fn missing_sections(markdown: &str) -> Vec<&'static str> {
    REPORT_SECTIONS
        .iter()
        .copied()
        .filter(|s| !markdown.contains(s))
        .collect()
}

/// Removes a markdown code fence wrapping the whole answer, if any.
fn unfence(s: &str) -> &str {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest
        .strip_prefix("markdown")
        .or_else(|| rest.strip_prefix("md"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Asks the model for the four-section analysis of `doc` grounded on `context`.
///
/// Never fails: a model error or a malformed answer yields [`AnalysisReport::fallback`].
#[instrument(skip_all, fields(doc = %doc.path.display(), context_len = context.len()))]
pub async fn analyze(
    llm: &dyn AnalystLlm,
    doc: &Document,
    context: &str,
    max_doc_chars: usize,
) -> AnalysisReport {
    let prompt = build_analysis_prompt(&doc.text, context, max_doc_chars);

    let answer = match llm.generate_markdown(ANALYSIS_SYSTEM, &prompt).await {
        Ok(a) => a,
        Err(e) => {
            warn!(target: "fiscal_analyst::report", error = %e, "analysis call failed, using fallback");
            return AnalysisReport::fallback();
        }
    };

    let markdown = unfence(&answer);
    if !is_well_formed(markdown) {
        warn!(
            target: "fiscal_analyst::report",
            excerpt = %make_snippet(markdown),
            "analysis does not start with a level-1 heading, using fallback"
        );
        return AnalysisReport::fallback();
    }

    let missing = missing_sections(markdown);
    if !missing.is_empty() {
        warn!(target: "fiscal_analyst::report", ?missing, "analysis lacks expected sections");
    }
    info!(target: "fiscal_analyst::report", chars = markdown.len(), "analysis generated");

    AnalysisReport {
        markdown: markdown.to_string(),
        fallback: false,
    }
}
