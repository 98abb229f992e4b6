//! Pipeline settings read from environment variables.

use std::path::PathBuf;

use fiscal_analyst::AnalystConfig;
use legis_store::DEFAULT_TOP_K;

use crate::error::{PipelineError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding `index_<keyword>.*` files.
    pub index_dir: PathBuf,
    pub top_k: usize,
    /// Expected embedding dimension; `None` accepts the model's.
    pub embedding_dim: Option<usize>,
    pub analyst: AnalystConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("."),
            top_k: DEFAULT_TOP_K,
            embedding_dim: None,
            analyst: AnalystConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Build configuration from environment variables.
    ///
    /// - `LEGIS_INDEX_DIR` (default: `.`)
    /// - `RAG_TOP_K` (default: 5)
    /// - `EMBEDDING_DIM` (optional)
    /// - analyst settings, see [`AnalystConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let top_k = read_usize_env("RAG_TOP_K")?.unwrap_or(d.top_k);
        if top_k == 0 {
            return Err(PipelineError::Config("RAG_TOP_K must be > 0".into()));
        }
        Ok(Self {
            index_dir: std::env::var("LEGIS_INDEX_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.index_dir),
            top_k,
            embedding_dim: read_usize_env("EMBEDDING_DIM")?,
            analyst: AnalystConfig::from_env(),
        })
    }
}

/// Optional `usize`; present-but-invalid is an error.
fn read_usize_env(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| PipelineError::Config(format!("cannot parse {key}='{v}' as usize"))),
        _ => Ok(None),
    }
}
