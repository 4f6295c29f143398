//! Access to the markup query engine's output.
//!
//! The engine itself is not part of this crate. Its answers are read from
//! pre-tokenised JSON dumps laid out per corpus directory:
//!
//! ```text
//! <corpus_dir>/index.json               [{documentId, bookCode, chapterCount}]
//! <corpus_dir>/<documentId>/<chapter>.json   [{subType, payload}]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::{DocumentEntry, Item};

#[derive(Error, Debug)]
pub enum ItemSourceError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("document '{0}' is not in the corpus index")]
    UnknownDocument(String),
}

pub trait ItemSource: Send + Sync {
    /// Documents of the corpus, in index order.
    fn document_index(&self) -> Result<Vec<DocumentEntry>, ItemSourceError>;

    /// Ordered item list for one chapter of one document.
    fn chapter_items(&self, document_id: &str, chapter: u32) -> Result<Vec<Item>, ItemSourceError>;
}

#[derive(Debug, Clone)]
pub struct JsonItemSource {
    corpus_dir: PathBuf,
}

impl JsonItemSource {
    pub fn new(corpus_dir: impl Into<PathBuf>) -> Self {
        JsonItemSource { corpus_dir: corpus_dir.into() }
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ItemSourceError> {
        let text = fs::read_to_string(path).map_err(|e| ItemSourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| ItemSourceError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl ItemSource for JsonItemSource {
    fn document_index(&self) -> Result<Vec<DocumentEntry>, ItemSourceError> {
        JsonItemSource::read_json(&self.corpus_dir.join("index.json"))
    }

    fn chapter_items(&self, document_id: &str, chapter: u32) -> Result<Vec<Item>, ItemSourceError> {
        let document_dir = self.corpus_dir.join(document_id);
        if !document_dir.is_dir() {
            return Err(ItemSourceError::UnknownDocument(document_id.to_string()));
        }
        JsonItemSource::read_json(&document_dir.join(format!("{}.json", chapter)))
    }
}
