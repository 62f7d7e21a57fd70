//! Compiled-language strategy.
//!
//! Each fragment is built and run on its own, in discovery order:
//!
//! ```text
//! fragment ──► write source ──► build commands ──► artifact
//!                                    │                 │
//!                          CompileSummary      one run per argument set
//! ```
//!
//! Failures are contained to the fragment unless it declares fail-on-error.

mod run;
mod scaffold;
mod strategy;

use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::discover::SourceFragment;
use crate::error::{Error, Result};
use crate::paths::DocumentDirs;
use crate::policy::ErrorPolicy;
use crate::process::ProcessRunner;

pub use run::{Launcher, RunOutcome, RunPlan, run_arg_set};
pub use scaffold::{
    DEFAULT_BUILD_FILE, SNIPPET_PREFIX, default_filename, wrap_snippet, write_build_file,
    write_source,
};
pub use strategy::{BuildTarget, CompileStrategy, DEFAULT_CMAKE_BUILD_DIR};

/// Build commands as shown to readers, and what they printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub commands: Vec<String>,
    pub stdout: String,
}

impl CompileSummary {
    /// One `$ <command>` line per build command.
    pub fn display(&self) -> String {
        self.commands
            .iter()
            .map(|c| format!("$ {}", c))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A successful build.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub path: PathBuf,
    pub summary: CompileSummary,
}

/// Which step of a compiled fragment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Run,
}

impl Stage {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Compile => "Compilation Error",
            Self::Run => "Execution Error",
        }
    }
}

/// A contained failure of one compiled fragment.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: Error,
}

/// Everything one compiled fragment produced.
#[derive(Debug, Default)]
pub struct CompiledFragment {
    /// Present once the build succeeded.
    pub summary: Option<CompileSummary>,
    /// One outcome per argument set that ran, in declaration order.
    pub runs: Vec<RunOutcome>,
    pub failure: Option<StageFailure>,
}

/// Resolved build settings for one fragment.
#[derive(Debug, Clone)]
pub struct CompilePlan {
    pub strategy: CompileStrategy,
    pub target: BuildTarget,
}

/// Builds and runs compiled fragments of one document.
pub struct CompileRunner<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a EngineConfig,
    dirs: &'a DocumentDirs,
}

impl<'a> CompileRunner<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a EngineConfig, dirs: &'a DocumentDirs) -> Self {
        Self {
            runner,
            config,
            dirs,
        }
    }

    /// Resolve strategy and file names. `None` for an unknown strategy.
    pub fn plan(&self, fragment: &SourceFragment) -> Option<CompilePlan> {
        let options = &fragment.options;
        let name = options
            .compile
            .as_deref()
            .unwrap_or(&self.config.default_compile_strategy);
        let strategy = CompileStrategy::parse(name)?;

        let source = options
            .filename
            .clone()
            .unwrap_or_else(|| default_filename(fragment));
        let executable = options.executable.clone().unwrap_or_else(|| {
            PathBuf::from(&source)
                .with_extension("exe")
                .to_string_lossy()
                .into_owned()
        });
        let flags = options
            .compiler_flags
            .as_deref()
            .unwrap_or(&self.config.default_compiler_flags)
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Some(CompilePlan {
            strategy,
            target: BuildTarget {
                source,
                executable,
                build_dir: strategy.build_dir(options.build_dir.as_deref()),
                flags,
            },
        })
    }

    /// Write the source and run the build commands.
    pub fn build(&self, fragment: &SourceFragment, plan: &CompilePlan) -> Result<BuildArtifact> {
        let target = &plan.target;
        let artifact = self
            .dirs
            .artifact_dir(&target.build_dir)
            .join(&target.executable);
        let compilation_error = |message: String, stderr: String| Error::Compilation {
            fragment: fragment.label(),
            message,
            stderr,
            source_dir: self.dirs.source_dir.clone(),
            artifact: artifact.clone(),
        };

        write_source(self.dirs, fragment, &target.source).map_err(|e| {
            compilation_error(
                format!("failed to write source `{}`: {}", target.source, e),
                String::new(),
            )
        })?;

        let mut summary = CompileSummary::default();
        for request in plan
            .strategy
            .commands(target, &self.dirs.source_dir, self.config)
        {
            let command = request.command_line();
            tracing::debug!("[{}] {}", plan.strategy.name(), command);

            let output = self
                .runner
                .run(&request)
                .map_err(|e| compilation_error(e.to_string(), String::new()))?;
            if !output.success() {
                return Err(compilation_error(
                    format!("`{}` exited with {:?}", command, output.status),
                    output.stderr,
                ));
            }
            summary.commands.push(command);
            summary.stdout.push_str(&output.stdout);
        }

        Ok(BuildArtifact {
            path: artifact,
            summary,
        })
    }

    /// Run plan for a built artifact.
    pub fn run_plan(&self, fragment: &SourceFragment, plan: &CompilePlan, artifact: &BuildArtifact) -> RunPlan {
        let build_dir = match plan.target.build_dir.as_str() {
            "" => ".",
            dir => dir,
        };
        let launcher = plan.strategy.is_mpi().then(|| Launcher {
            program: self.config.mpi_launcher.clone(),
            process_count: fragment
                .options
                .process_count
                .unwrap_or(self.config.default_process_count),
        });

        RunPlan {
            artifact: artifact.path.clone(),
            source_dir: self.dirs.source_dir.clone(),
            display_path: format!("{}/{}", build_dir, plan.target.executable),
            launcher,
            stdin: fragment.options.stdin.clone(),
        }
    }

    /// Build the fragment and run every argument set.
    ///
    /// Returns `Ok(None)` when the strategy is unknown and the fragment is
    /// skipped. Fragment-scoped failures end up in
    /// [`CompiledFragment::failure`] unless the fragment fails fast.
    pub fn process(&self, fragment: &SourceFragment) -> Result<Option<CompiledFragment>> {
        let Some(plan) = self.plan(fragment) else {
            tracing::warn!(
                "Skipping {}: unknown compile strategy `{}`",
                fragment.label(),
                fragment.options.compile.as_deref().unwrap_or_default()
            );
            return Ok(None);
        };
        let policy = ErrorPolicy::for_fragment(&fragment.options);
        let mut outcome = CompiledFragment::default();

        tracing::info!("Building {} with {}", fragment.label(), plan.strategy.name());
        let artifact = match self.build(fragment, &plan) {
            Ok(artifact) => artifact,
            Err(e) => {
                let error = policy.contain(e)?;
                tracing::error!("{}: {}", fragment.label(), error);
                outcome.failure = Some(StageFailure {
                    stage: Stage::Compile,
                    error,
                });
                return Ok(Some(outcome));
            }
        };
        outcome.summary = Some(artifact.summary.clone());

        if !fragment.options.run {
            return Ok(Some(outcome));
        }

        let run_plan = self.run_plan(fragment, &plan, &artifact);
        for args in &fragment.options.arg_sets {
            match run_arg_set(self.runner, &run_plan, args, self.config) {
                Ok(run) => outcome.runs.push(run),
                Err(e) => {
                    let error = policy.contain(e)?;
                    tracing::error!("{}: {}", fragment.label(), error);
                    outcome.failure = Some(StageFailure {
                        stage: Stage::Run,
                        error,
                    });
                    break;
                }
            }
        }

        Ok(Some(outcome))
    }
}
