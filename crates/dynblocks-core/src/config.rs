//! Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default output buffer per external invocation (50 MiB).
pub const DEFAULT_MAX_BUFFER: usize = 50 * 1024 * 1024;

/// Configuration for one engine pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interpreter used for the session strategy
    pub interpreter: String,

    /// Arguments passed to the interpreter (script arrives on stdin)
    pub interpreter_args: Vec<String>,

    /// Languages executed in one shared interpreter session
    pub session_languages: Vec<String>,

    /// Languages built and run as native programs
    pub compiled_languages: Vec<String>,

    /// Languages whose fragments are written out as build files
    pub build_file_languages: Vec<String>,

    /// Maximum captured bytes per stream per invocation
    pub max_buffer_bytes: usize,

    /// Timeout per external invocation (None disables it)
    pub timeout_secs: Option<u64>,

    /// Root under which per-document sources are materialized
    pub source_root: PathBuf,

    /// Cache directory used when the document declares an empty one
    pub default_cache_dir: PathBuf,

    /// Compile strategy when a fragment names none
    pub default_compile_strategy: String,

    /// Compiler flags when a fragment names none
    pub default_compiler_flags: String,

    /// MPI process count when a fragment names none
    pub default_process_count: u32,

    /// Launcher prefixed to MPI runs
    pub mpi_launcher: String,

    /// Only run when the document carries the `dynamic-blocks` attribute
    pub require_marker: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            interpreter_args: vec!["-".to_string()],
            session_languages: vec!["python".to_string()],
            compiled_languages: vec!["c".to_string(), "cpp".to_string()],
            build_file_languages: vec!["cmake".to_string()],
            max_buffer_bytes: DEFAULT_MAX_BUFFER,
            timeout_secs: Some(600),
            source_root: PathBuf::from("cpp"),
            default_cache_dir: PathBuf::from(".cache"),
            default_compile_strategy: "make".to_string(),
            default_compiler_flags: "-std=c++17".to_string(),
            default_process_count: 2,
            mpi_launcher: "mpirun".to_string(),
            require_marker: true,
        }
    }
}

impl EngineConfig {
    /// Create a config whose relative paths resolve against `root`.
    ///
    /// The CLI uses the directory of the input document as root.
    pub fn for_document_root(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            source_root: root.join(&defaults.source_root),
            default_cache_dir: root.join(&defaults.default_cache_dir),
            ..defaults
        }
    }

    /// Load a config from a JSON file, filling absent fields with defaults.
    pub fn from_json_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Per-invocation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn is_session_language(&self, language: &str) -> bool {
        self.session_languages.iter().any(|l| l == language)
    }

    pub fn is_compiled_language(&self, language: &str) -> bool {
        self.compiled_languages.iter().any(|l| l == language)
    }

    pub fn is_build_file_language(&self, language: &str) -> bool {
        self.build_file_languages.iter().any(|l| l == language)
    }
}
