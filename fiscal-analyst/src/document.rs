//! Input documents (NF-e XML or plain text).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{AnalystError, Result};

/// One input unit: its text and where it came from. Immutable once read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    /// Reads `path` as UTF-8. Invalid sequences are replaced rather than rejected.
    ///
    /// # Errors
    /// [`AnalystError::InputNotFound`] when the file does not exist.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AnalystError::InputNotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    target: "fiscal_analyst::document",
                    path = %path.display(),
                    "document is not valid UTF-8, replacing invalid bytes"
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        info!(
            target: "fiscal_analyst::document",
            path = %path.display(),
            chars = text.chars().count(),
            "document read"
        );
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// File name without extension, used to name the report.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documento".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_input_not_found() {
        let err = Document::read("/definitely/not/here.xml").unwrap_err();
        assert!(matches!(err, AnalystError::InputNotFound(_)));
    }

    #[test]
    fn stem_drops_extension() {
        let d = Document {
            path: PathBuf::from("/tmp/nfe_123.xml"),
            text: String::new(),
        };
        assert_eq!(d.stem(), "nfe_123");
    }
}
