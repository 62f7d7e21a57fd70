//! Result cache store.
//!
//! An audit log of cell results, one JSON file per cell identifier. It is
//! written on every pass and never read back to skip execution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::DocumentHost;
use crate::error::Result;
use crate::options::CACHE_ATTRIBUTE;
use crate::session::CellResult;

/// Cache directory of one document.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache declared by the document, if any.
    ///
    /// An empty attribute value selects `default_dir`.
    pub fn for_document<D: DocumentHost + ?Sized>(doc: &D, default_dir: &Path) -> Option<Self> {
        let declared = doc.attribute(CACHE_ATTRIBUTE)?;
        let dir = if declared.trim().is_empty() {
            default_dir.to_path_buf()
        } else {
            PathBuf::from(declared)
        };
        Some(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the result with identifier `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write `result`, replacing any previous entry.
    pub fn store(&self, result: &CellResult) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&result.id);
        fs::write(&path, serde_json::to_string(result)?)?;
        tracing::debug!("Cached {} at {}", result.id, path.display());
        Ok(path)
    }
}
