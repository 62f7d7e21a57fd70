//! Build strategies for compiled fragments.

use std::path::Path;

use crate::config::EngineConfig;
use crate::process::ExecutionRequest;

/// Build directory used by `cmake` when the fragment names none.
pub const DEFAULT_CMAKE_BUILD_DIR: &str = "build";

/// How a compiled fragment is turned into an executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStrategy {
    /// `g++ <flags> <src> -o <exe>` (`sh` and `cpp`)
    Gxx,
    /// `gcc <flags> <src> -o <exe>`
    Gcc,
    /// `g++ <flags> -fopenmp <src> -o <exe>`
    OpenMp,
    /// `mpicxx <src> -o <exe>`, run under the MPI launcher
    Mpi,
    /// `make <exe>` against a hand-written Makefile
    Make,
    /// `cmake -B <build> .` then `cmake --build <build>`
    CMake,
}

impl CompileStrategy {
    /// Parse the `compile` attribute. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sh" | "cpp" => Some(Self::Gxx),
            "c" => Some(Self::Gcc),
            "openmp" => Some(Self::OpenMp),
            "mpi" => Some(Self::Mpi),
            "make" => Some(Self::Make),
            "cmake" => Some(Self::CMake),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gxx => "cpp",
            Self::Gcc => "c",
            Self::OpenMp => "openmp",
            Self::Mpi => "mpi",
            Self::Make => "make",
            Self::CMake => "cmake",
        }
    }

    /// Whether runs go through the MPI launcher.
    pub fn is_mpi(&self) -> bool {
        matches!(self, Self::Mpi)
    }

    /// Build directory for the artifact. Only `cmake` builds out of tree.
    pub fn build_dir(&self, declared: Option<&str>) -> String {
        match self {
            Self::CMake => declared
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_CMAKE_BUILD_DIR)
                .to_string(),
            _ => String::new(),
        }
    }

    /// Commands that build `target`, in order, each run from `source_dir`.
    pub fn commands(
        &self,
        target: &BuildTarget,
        source_dir: &Path,
        config: &EngineConfig,
    ) -> Vec<ExecutionRequest> {
        let compiler = |program: &str, extra: &[&str]| {
            ExecutionRequest::new(program)
                .args(target.flags.iter().cloned())
                .args(extra.iter().copied())
                .args([target.source.as_str(), "-o", target.executable.as_str()])
        };

        let requests = match self {
            Self::Gxx => vec![compiler("g++", &[])],
            Self::Gcc => vec![compiler("gcc", &[])],
            Self::OpenMp => vec![compiler("g++", &["-fopenmp"])],
            Self::Mpi => vec![
                ExecutionRequest::new("mpicxx")
                    .args([target.source.as_str(), "-o", target.executable.as_str()]),
            ],
            Self::Make => vec![ExecutionRequest::new("make").arg(target.executable.as_str())],
            Self::CMake => vec![
                ExecutionRequest::new("cmake").args(["-B", target.build_dir.as_str(), "."]),
                ExecutionRequest::new("cmake").args(["--build", target.build_dir.as_str()]),
            ],
        };

        requests
            .into_iter()
            .map(|request| request.cwd(source_dir).limits(config))
            .collect()
    }
}

/// File names involved in building one fragment, relative to its source dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub source: String,
    pub executable: String,
    pub build_dir: String,
    pub flags: Vec<String>,
}
