//! Corpus construction: search, recover, extract, embed, persist.

use std::path::{Path, PathBuf};

use legis_store::persist::save;
use legis_store::{EmbeddingsProvider, FlatL2Index, IndexPaths, StoreError};
use tracing::{info, instrument, warn};

use crate::errors::{CorpusError, Result};
use crate::payload::recover_payload;
use crate::portal::LegislationSource;
use crate::visitor::extract_passages;

/// Result of a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorpusOutcome {
    /// Index and metadata were written.
    Built {
        paths: IndexPaths,
        passages: usize,
        dim: usize,
    },
    /// The portal returned no usable rows; nothing was written.
    Empty,
}

impl CorpusOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, CorpusOutcome::Empty)
    }
}

/// Builds the per-keyword index from a search source and an embedding backend.
pub struct CorpusBuilder<'a> {
    source: &'a dyn LegislationSource,
    embedder: &'a dyn EmbeddingsProvider,
    index_dir: PathBuf,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(
        source: &'a dyn LegislationSource,
        embedder: &'a dyn EmbeddingsProvider,
        index_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            embedder,
            index_dir: index_dir.into(),
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Queries the portal for `keyword` and persists the resulting index.
    ///
    /// Files already present for the same keyword are replaced.
    ///
    /// # Errors
    /// - [`CorpusError::InvalidConfig`] for a blank keyword
    /// - [`CorpusError::StaleCredential`] / [`CorpusError::Upstream`] when the portal fails
    /// - [`CorpusError::MalformedPayload`] when the response holds no JSON array
    /// - [`CorpusError::Store`] for embedding or write failures
    ///
    /// No file is written unless every step succeeds.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn build(&self, keyword: &str) -> Result<CorpusOutcome> {
        if keyword.trim().is_empty() {
            return Err(CorpusError::InvalidConfig("keyword must not be empty".into()));
        }

        let body = self.source.search(keyword).await?;
        let payload = recover_payload(&body)?;
        let passages = extract_passages(&payload);

        if passages.is_empty() {
            warn!(
                target: "legis_corpus::build",
                "no ResultRows with Path and content found; index not written"
            );
            return Ok(CorpusOutcome::Empty);
        }

        let texts: Vec<String> = passages.iter().map(|p| p.conteudo.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != passages.len() {
            return Err(StoreError::CountMismatch {
                vectors: vectors.len(),
                passages: passages.len(),
            }
            .into());
        }

        let index = FlatL2Index::from_vectors(&vectors)?;
        let paths = IndexPaths::for_keyword(&self.index_dir, keyword);
        save(&paths, &index, &passages)?;

        info!(
            target: "legis_corpus::build",
            passages = passages.len(),
            dim = index.dim(),
            index = %paths.index.display(),
            "corpus built"
        );
        Ok(CorpusOutcome::Built {
            passages: passages.len(),
            dim: index.dim(),
            paths,
        })
    }
}
