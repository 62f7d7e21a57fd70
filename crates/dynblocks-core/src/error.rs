//! Error types for dynblocks-core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for dynblocks-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while executing and embedding dynamic blocks.
#[derive(Debug, Error)]
pub enum Error {
    /// A build tool returned non-zero or could not be started.
    #[error("compilation failed for {fragment}: {message}")]
    Compilation {
        fragment: String,
        message: String,
        stderr: String,
        source_dir: PathBuf,
        artifact: PathBuf,
    },

    /// An interpreter session or a compiled run failed.
    #[error("execution error: {message}")]
    Execution {
        message: String,
        stdout: String,
        stderr: String,
    },

    /// A cell reported failure and its fragment opted into fail-fast.
    #[error("cell {id} failed: {output}")]
    CellFailed { id: String, output: String },

    /// The build artifact is absent when it is about to be run.
    #[error("expected compiled executable not found at: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// The session side channel was missing or malformed.
    #[error("invalid session results: {0}")]
    Protocol(String),

    /// An external program could not be resolved or spawned.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program ran longer than the configured timeout.
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// An external program produced more output than the buffer allows.
    #[error("{program} exceeded the output buffer of {limit} bytes")]
    OutputLimit { program: String, limit: usize },

    /// The host document violated the tree contract.
    #[error("document error: {0}")]
    Document(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an execution error from a message alone.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Whether the compiled strategy may contain this error to one fragment.
    ///
    /// IO, JSON and document errors always abort the pass.
    pub fn is_fragment_scoped(&self) -> bool {
        matches!(
            self,
            Self::Compilation { .. }
                | Self::Execution { .. }
                | Self::MissingArtifact(_)
                | Self::Spawn { .. }
                | Self::Timeout { .. }
                | Self::OutputLimit { .. }
        )
    }

    /// Captured stderr, when the error carries any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Compilation { stderr, .. } | Self::Execution { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// A short hint for recovering from common environment problems.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Self::Spawn { program, .. } => Some(format!(
                "make sure `{}` is installed and reachable on PATH",
                program
            )),
            Self::Protocol(_) => Some(
                "the interpreter needs IPython installed (pip install ipython)".to_string(),
            ),
            Self::Timeout { .. } => {
                Some("raise `timeout_secs` in the engine config or pass --timeout".to_string())
            }
            Self::OutputLimit { .. } => Some("raise `max_buffer_bytes` in the engine config".to_string()),
            _ => None,
        };

        match hint {
            Some(hint) => format!("{}\n  hint: {}", self, hint),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_scoped() {
        assert!(Error::MissingArtifact(PathBuf::from("a.exe")).is_fragment_scoped());
        assert!(Error::execution("boom").is_fragment_scoped());
        assert!(!Error::Protocol("bad".into()).is_fragment_scoped());
        assert!(!Error::Document("gone".into()).is_fragment_scoped());
    }

    #[test]
    fn test_missing_artifact_message() {
        let err = Error::MissingArtifact(PathBuf::from("cpp/doc/hello.exe"));
        assert_eq!(
            err.to_string(),
            "expected compiled executable not found at: cpp/doc/hello.exe"
        );
    }

    #[test]
    fn test_hint_for_spawn() {
        let err = Error::Spawn {
            program: "python3".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.with_hint().contains("reachable on PATH"));
    }
}
