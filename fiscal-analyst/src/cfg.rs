//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Footer printed on every rendered report.
pub const DEFAULT_FOOTER: &str = "Análise Gerada por IA - Documento Confidencial";

/// Config bag for the analyst stages. All fields have defaults via `from_env`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalystConfig {
    /// Flat pause before the analysis call.
    pub rate_limit_delay: Duration,
    /// Document characters sent to the model; longer inputs are cut.
    pub max_doc_chars: usize,
    /// Where reports go; `None` writes next to the source document.
    pub output_dir: Option<PathBuf>,
    pub footer: String,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(3),
            max_doc_chars: 60_000,
            output_dir: None,
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl AnalystConfig {
    /// Build from environment variables with defaults.
    ///
    /// - `LLM_RATE_LIMIT_DELAY_SECS` (default: 3)
    /// - `ANALYST_MAX_DOC_CHARS` (default: 60000)
    /// - `REPORT_OUTPUT_DIR` (default: next to the source)
    /// - `REPORT_FOOTER`
    ///
    /// # Example
    /// ```
    /// # use fiscal_analyst::cfg::AnalystConfig;
    /// let cfg = AnalystConfig::from_env();
    /// assert!(cfg.max_doc_chars >= 1);
    /// ```
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            rate_limit_delay: Duration::from_secs(parse(
                "LLM_RATE_LIMIT_DELAY_SECS",
                d.rate_limit_delay.as_secs(),
            )),
            max_doc_chars: parse("ANALYST_MAX_DOC_CHARS", d.max_doc_chars).max(1),
            output_dir: std::env::var("REPORT_OUTPUT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            footer: env("REPORT_FOOTER", &d.footer),
        }
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k).unwrap_or_else(|_| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}
