//! Argument-set runs of a built artifact.

use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::process::{ExecutionRequest, ProcessRunner};

/// Process launcher prefixed to a run (`mpirun -np 4`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    pub program: String,
    pub process_count: u32,
}

impl Launcher {
    fn args(&self) -> [String; 2] {
        ["-np".to_string(), self.process_count.to_string()]
    }

    fn prefix(&self) -> String {
        format!("{} -np {} ", self.program, self.process_count)
    }
}

/// Everything needed to run one built artifact.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Artifact location on disk.
    pub artifact: PathBuf,
    /// Directory the commands run in.
    pub source_dir: PathBuf,
    /// Artifact path as shown to readers, relative to `source_dir`.
    pub display_path: String,
    pub launcher: Option<Launcher>,
    pub stdin: Option<String>,
}

/// Captured result of one argument set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The argument set as declared.
    pub args: String,
    /// `$ <launcher><path> <args>` plus the stdin text, if any.
    pub display: String,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run the artifact once with `args`.
///
/// The artifact must exist before anything is spawned.
pub fn run_arg_set(
    runner: &dyn ProcessRunner,
    plan: &RunPlan,
    args: &str,
    config: &EngineConfig,
) -> Result<RunOutcome> {
    if !plan.artifact.is_file() {
        return Err(Error::MissingArtifact(plan.artifact.clone()));
    }
    let artifact = absolute(&plan.artifact)?;
    let artifact = artifact.to_string_lossy().into_owned();
    let split_args = args.split_whitespace();

    let request = match &plan.launcher {
        Some(launcher) => ExecutionRequest::new(&launcher.program)
            .args(launcher.args())
            .arg(artifact)
            .args(split_args),
        None => ExecutionRequest::new(artifact).args(split_args),
    };
    let mut request = request.cwd(&plan.source_dir).limits(config);
    if let Some(stdin) = &plan.stdin {
        request = request.stdin(stdin.clone());
    }

    let output = runner.run(&request).map_err(|e| match e {
        Error::Spawn { .. } => Error::Execution {
            message: e.to_string(),
            stdout: String::new(),
            stderr: String::new(),
        },
        other => other,
    })?;

    if !output.success() {
        tracing::warn!(
            "{} exited with {:?}",
            plan.display_path,
            output.status
        );
    }

    Ok(RunOutcome {
        args: args.to_string(),
        display: display_line(plan, args),
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

fn display_line(plan: &RunPlan, args: &str) -> String {
    let prefix = plan.launcher.as_ref().map(Launcher::prefix).unwrap_or_default();
    let mut line = format!("$ {}{}", prefix, plan.display_path);
    if !args.is_empty() {
        line.push(' ');
        line.push_str(args);
    }
    if let Some(stdin) = &plan.stdin {
        line.push('\n');
        line.push_str(stdin);
    }
    line
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
