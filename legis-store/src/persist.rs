//! On-disk layout: a binary flat index plus a JSON metadata sidecar.
//!
//! Index file layout (little-endian):
//!
//! | bytes | field |
//! |---|---|
//! | 4 | magic `LGFL` |
//! | 4 | version (`u32`, currently 1) |
//! | 4 | dimension (`u32`) |
//! | 8 | vector count (`u64`) |
//! | count * dim * 4 | `f32` components, row-major |
//!
//! The sidecar is a JSON array `[{id, path, conteudo}, ...]` in ascending id order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::errors::{Result, StoreError};
use crate::flat_index::FlatL2Index;
use crate::record::Passage;

const MAGIC: &[u8; 4] = b"LGFL";
const VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// File names derived from a keyword: `index_<keyword>.flatl2` and `index_<keyword>_metadados.json`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPaths {
    pub index: PathBuf,
    pub metadata: PathBuf,
}

impl IndexPaths {
    /// Paths for `keyword` inside `dir`. The keyword is reduced to a file-safe token.
    pub fn for_keyword(dir: impl AsRef<Path>, keyword: &str) -> Self {
        let base = format!("index_{}", sanitize_keyword(keyword));
        let dir = dir.as_ref();
        Self {
            index: dir.join(format!("{base}.flatl2")),
            metadata: dir.join(format!("{base}_metadados.json")),
        }
    }

    /// Both files are present.
    pub fn exist(&self) -> bool {
        self.index.is_file() && self.metadata.is_file()
    }
}

/// Keeps alphanumerics (any script), `-` and `_`; every other run of characters becomes one `_`.
///
/// ```
/// use legis_store::persist::sanitize_keyword;
/// assert_eq!(sanitize_keyword("açúcar venda / ICMS"), "açúcar_venda_ICMS");
/// ```
pub fn sanitize_keyword(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    let mut pending_sep = false;
    for c in keyword.trim().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Index and metadata loaded from disk, already checked for alignment.
#[derive(Clone, Debug)]
pub struct LoadedIndex {
    pub index: FlatL2Index,
    pub passages: Vec<Passage>,
}

/// Checks the position-alignment contract between vectors and metadata.
fn check_alignment(index: &FlatL2Index, passages: &[Passage]) -> Result<()> {
    if index.len() != passages.len() {
        return Err(StoreError::CountMismatch {
            vectors: index.len(),
            passages: passages.len(),
        });
    }
    if let Some((position, p)) = passages.iter().enumerate().find(|(i, p)| p.id != *i) {
        return Err(StoreError::MisalignedId {
            position,
            id: p.id,
        });
    }
    Ok(())
}

/// Persists `index` and `passages`, replacing any previous files for the same keyword.
///
/// Both files are written to temporaries first and renamed into place once complete.
///
/// # Errors
/// [`StoreError::CountMismatch`] / [`StoreError::MisalignedId`] before anything is written;
/// [`StoreError::Io`] / [`StoreError::Parse`] on write failures.
#[instrument(skip_all, fields(index = %paths.index.display(), n = passages.len()))]
pub fn save(paths: &IndexPaths, index: &FlatL2Index, passages: &[Passage]) -> Result<()> {
    check_alignment(index, passages)?;

    if paths.exist() {
        warn!(
            target: "legis_store::index",
            index = %paths.index.display(),
            "overwriting existing index"
        );
    }
    for parent in [paths.index.parent(), paths.metadata.parent()].into_iter().flatten() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let index_tmp = tmp_path(&paths.index);
    let meta_tmp = tmp_path(&paths.metadata);

    fs::write(&index_tmp, encode_index(index)?)?;
    fs::write(&meta_tmp, serde_json::to_vec_pretty(passages)?)?;
    fs::rename(&index_tmp, &paths.index)?;
    fs::rename(&meta_tmp, &paths.metadata)?;

    info!(
        target: "legis_store::index",
        vectors = index.len(),
        dim = index.dim(),
        metadata = %paths.metadata.display(),
        "index saved"
    );
    Ok(())
}

/// Loads and validates an index written by [`save`].
///
/// # Errors
/// [`StoreError::NotFound`] when either file is absent, [`StoreError::CorruptIndex`] for a bad
/// index file, alignment errors when the two files disagree.
#[instrument(skip_all, fields(index = %paths.index.display()))]
pub fn load(paths: &IndexPaths) -> Result<LoadedIndex> {
    if !paths.exist() {
        return Err(StoreError::NotFound {
            index: paths.index.clone(),
            metadata: paths.metadata.clone(),
        });
    }

    let index = decode_index(&paths.index, &fs::read(&paths.index)?)?;
    let passages: Vec<Passage> = serde_json::from_slice(&fs::read(&paths.metadata)?)?;
    check_alignment(&index, &passages)?;

    info!(
        target: "legis_store::index",
        vectors = index.len(),
        dim = index.dim(),
        "index loaded"
    );
    Ok(LoadedIndex { index, passages })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn encode_index(index: &FlatL2Index) -> Result<Vec<u8>> {
    let dim = u32::try_from(index.dim())
        .map_err(|_| StoreError::InvalidIndex("dimension does not fit in u32"))?;
    let data = index.as_slice();

    let mut buf = Vec::with_capacity(HEADER_LEN + data.len() * 4);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&dim.to_le_bytes());
    buf.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for x in data {
        buf.extend_from_slice(&x.to_le_bytes());
    }
    Ok(buf)
}

fn decode_index(path: &Path, bytes: &[u8]) -> Result<FlatL2Index> {
    let corrupt = |reason: String| StoreError::CorruptIndex {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!("{} bytes is shorter than the header", bytes.len())));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if &header[0..4] != MAGIC {
        return Err(corrupt("bad magic".into()));
    }
    let version = u32::from_le_bytes(word(&header[4..8]));
    if version != VERSION {
        return Err(corrupt(format!("unsupported version {version}")));
    }
    let dim = u32::from_le_bytes(word(&header[8..12])) as usize;
    let count = u64::from_le_bytes(dword(&header[12..20])) as usize;

    let expected = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt("header overflows".into()))?;
    if body.len() != expected {
        return Err(corrupt(format!(
            "expected {expected} data bytes for {count}x{dim}, found {}",
            body.len()
        )));
    }

    let data = body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(word(c)))
        .collect();
    FlatL2Index::from_raw(dim, data).map_err(|e| corrupt(e.to_string()))
}

fn word(b: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(b);
    out
}

fn dword(b: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_sanitizing() {
        assert_eq!(sanitize_keyword("sugar sale tax"), "sugar_sale_tax");
        assert_eq!(sanitize_keyword("../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_keyword("  "), "_");
        assert_eq!(sanitize_keyword("ICMS-ST"), "ICMS-ST");
    }

    #[test]
    fn paths_follow_naming_scheme() {
        let p = IndexPaths::for_keyword("/data", "borracha");
        assert_eq!(p.index, PathBuf::from("/data/index_borracha.flatl2"));
        assert_eq!(p.metadata, PathBuf::from("/data/index_borracha_metadados.json"));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let idx = FlatL2Index::from_vectors(&[vec![1.0, 2.0]]).unwrap();
        let mut bytes = encode_index(&idx).unwrap();
        bytes.pop();
        let err = decode_index(Path::new("x"), &bytes).unwrap_err();
        assert!(matches!(err, StoreError::CorruptIndex { .. }));
    }

    #[test]
    fn encode_decode_keeps_components() {
        let idx = FlatL2Index::from_vectors(&[vec![0.5, -1.25], vec![3.0, 4.0]]).unwrap();
        let back = decode_index(Path::new("x"), &encode_index(&idx).unwrap()).unwrap();
        assert_eq!(back, idx);
    }
}
