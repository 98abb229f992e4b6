//! NF-e analyst: the two LLM-facing stages and report rendering.
//!
//! - [`terms::extract_terms`]: document → [`SearchTerms`] (`termo_curto`, `termo_completo`).
//! - [`report::analyze`]: document + retrieved legislation → four-section markdown,
//!   or a fallback when the answer is unusable.
//! - [`render::render_report`]: markdown → paginated A4 `<stem>_analise.pdf`.

pub mod cfg;
pub mod document;
pub mod error;
pub mod layout;
pub mod llm;
pub mod prompt;
pub mod render;
pub mod report;
pub mod terms;

pub use cfg::AnalystConfig;
pub use document::Document;
pub use error::AnalystError;
pub use llm::{AnalystLlm, LlmFuture};
pub use render::render_report;
pub use report::{AnalysisReport, FALLBACK_REPORT, analyze, is_well_formed};
pub use terms::{SearchTerms, extract_terms};
