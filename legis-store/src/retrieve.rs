//! Retrieval: embed the query, scan the flat index, map ids back to passages.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::embed::{EmbeddingsProvider, embed_one};
use crate::errors::Result;
use crate::persist::{IndexPaths, LoadedIndex, load};
use crate::record::RetrievalResult;

/// Number of passages returned when the caller does not choose.
pub const DEFAULT_TOP_K: usize = 5;

/// Embeds `query` and returns up to `k` passages by ascending distance.
///
/// Unfilled slots (index smaller than `k`) are skipped, so the result may be
/// shorter than `k`. Ranks are 1-based.
///
/// # Errors
/// Embedding failures or a query vector of the wrong dimension.
#[instrument(skip_all, fields(k = k, vectors = loaded.index.len()))]
pub async fn retrieve(
    loaded: &LoadedIndex,
    embedder: &dyn EmbeddingsProvider,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievalResult>> {
    let qv = embed_one(embedder, query).await?;
    let filled = k.min(loaded.index.len());
    let slots = loaded.index.search(&qv, filled)?;

    let mut out = Vec::with_capacity(filled);
    for (slot, neighbor) in slots.enumerate() {
        let Some(n) = neighbor else { continue };
        let Some(passage) = loaded.passages.get(n.id) else {
            warn!(target: "legis_store::retrieve", id = n.id, "hit without metadata, skipped");
            continue;
        };
        out.push(RetrievalResult {
            rank: slot + 1,
            distance: n.distance,
            passage: passage.clone(),
        });
    }

    if out.is_empty() {
        warn!(target: "legis_store::retrieve", "no relevant passages found");
    } else {
        info!(target: "legis_store::retrieve", hits = out.len(), "retrieval finished");
    }
    Ok(out)
}

/// Loads the index built for `keyword` under `dir` and runs [`retrieve`].
///
/// # Errors
/// [`crate::StoreError::NotFound`] when the corpus was never built for `keyword`.
pub async fn search_keyword(
    dir: &Path,
    keyword: &str,
    embedder: &dyn EmbeddingsProvider,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievalResult>> {
    let loaded = load(&IndexPaths::for_keyword(dir, keyword))?;
    retrieve(&loaded, embedder, query, k).await
}

/// Plain-text context block, one section per result.
///
/// ```
/// use legis_store::{Passage, RetrievalResult, format_results};
///
/// let r = RetrievalResult {
///     rank: 1,
///     distance: 0.5,
///     passage: Passage { id: 0, path: "https://x/lei".into(), conteudo: "Art. 1".into() },
/// };
/// assert_eq!(
///     format_results(&[r]),
///     "--- DOCUMENTO RANK 1 ---\nURL/Fonte: https://x/lei\nDistância (Similaridade): 0.5000\nConteúdo:\nArt. 1\n\n"
/// );
/// ```
pub fn format_results(results: &[RetrievalResult]) -> String {
    let mut out = String::new();
    for r in results {
        let _ = write!(
            out,
            "--- DOCUMENTO RANK {} ---\nURL/Fonte: {}\nDistância (Similaridade): {:.4}\nConteúdo:\n{}\n\n",
            r.rank, r.passage.path, r.distance, r.passage.conteudo
        );
    }
    out
}
