//! Per-document directory management.
//!
//! Compiled fragments and build files of one document share a directory so
//! that hand-written build files (Makefile, CMakeLists.txt) can see the
//! sources next to them, while different documents never collide:
//!
//! ```text
//! <source_root>/
//! ├── intro/          # document `intro.adoc`
//! │   ├── CMakeLists.txt
//! │   ├── hello.cpp
//! │   └── build/      # cmake build directory
//! └── advanced/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory layout for one document's compiled fragments.
#[derive(Debug, Clone)]
pub struct DocumentDirs {
    /// Directory holding sources and build files for the document.
    pub source_dir: PathBuf,
}

impl DocumentDirs {
    /// Create the directory for `document_name` under `source_root`.
    ///
    /// # Errors
    /// Returns an error if directory creation fails.
    pub fn create(source_root: &Path, document_name: &str) -> Result<Self> {
        let source_dir = source_root.join(document_stem(document_name));
        fs::create_dir_all(&source_dir)?;
        Ok(Self { source_dir })
    }

    /// Path of a file inside the source directory.
    pub fn file(&self, filename: &str) -> PathBuf {
        self.source_dir.join(filename)
    }

    /// Directory the artifact is expected in.
    ///
    /// An empty build directory means the artifact sits next to the source.
    pub fn artifact_dir(&self, build_dir: &str) -> PathBuf {
        if build_dir.is_empty() {
            self.source_dir.clone()
        } else {
            self.source_dir.join(build_dir)
        }
    }

    /// Remove all materialized sources and artifacts and recreate the directory.
    pub fn clean(&self) -> Result<()> {
        if self.source_dir.exists() {
            fs::remove_dir_all(&self.source_dir)?;
        }
        fs::create_dir_all(&self.source_dir)?;
        Ok(())
    }
}

/// Base name of a document without directories or extension.
pub fn document_stem(document_name: &str) -> String {
    Path::new(document_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}
