//! Portal settings read from environment variables.

use crate::errors::{CorpusError, Result};

/// Search endpoint of the SEFAZ-SP legislation portal.
pub const DEFAULT_PORTAL_URL: &str =
    "https://legislacao.fazenda.sp.gov.br/_vti_bin/client.svc/ProcessQuery";
/// Search page; sent as `Referer` and used as the `ResultsUrl` prefix.
pub const DEFAULT_SEARCH_PAGE: &str = "https://legislacao.fazenda.sp.gov.br/Paginas/Search.aspx?";
/// Placeholder digest. Real digests expire, so requests with this one mostly end in 403.
pub const DEFAULT_REQUEST_DIGEST: &str = "0x00,27 Oct 2025 23:00:32 -0000";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Portal connectivity and query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub url: String,
    pub search_page: String,
    pub request_digest: String,
    pub user_agent: String,
    /// `RowsPerPage` / `RowLimit` of the query.
    pub row_limit: usize,
    pub timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PORTAL_URL.to_string(),
            search_page: DEFAULT_SEARCH_PAGE.to_string(),
            request_digest: DEFAULT_REQUEST_DIGEST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            row_limit: 30,
            timeout_secs: 30,
        }
    }
}

impl PortalConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `PORTAL_URL`
    /// - `PORTAL_SEARCH_PAGE`
    /// - `PORTAL_REQUEST_DIGEST`
    /// - `PORTAL_USER_AGENT`
    /// - `PORTAL_ROW_LIMIT` (default: 30)
    /// - `PORTAL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let cfg = Self {
            url: read_string_env("PORTAL_URL").unwrap_or(d.url),
            search_page: read_string_env("PORTAL_SEARCH_PAGE").unwrap_or(d.search_page),
            request_digest: read_string_env("PORTAL_REQUEST_DIGEST").unwrap_or(d.request_digest),
            user_agent: read_string_env("PORTAL_USER_AGENT").unwrap_or(d.user_agent),
            row_limit: read_parsed_env("PORTAL_ROW_LIMIT")?.unwrap_or(d.row_limit),
            timeout_secs: read_parsed_env("PORTAL_TIMEOUT_SECS")?.unwrap_or(d.timeout_secs),
        };

        if cfg.row_limit == 0 {
            return Err(CorpusError::InvalidConfig("PORTAL_ROW_LIMIT must be > 0".into()));
        }
        if !(cfg.url.starts_with("http://") || cfg.url.starts_with("https://")) {
            return Err(CorpusError::InvalidConfig(
                "PORTAL_URL must start with http:// or https://".into(),
            ));
        }
        Ok(cfg)
    }
}

fn read_string_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Optional parsed value; present-but-invalid is an error.
fn read_parsed_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match read_string_env(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CorpusError::InvalidConfig(format!("cannot parse {key}='{v}'"))),
        None => Ok(None),
    }
}
