//! Interpreter-session strategy.
//!
//! One [`ExecutionSession`] per document conversion. Its cells run in one
//! interpreter process and share a namespace, so cell `i` sees every binding
//! made by cells `0..i`. Any failure of the process itself fails the whole
//! session, since shared state may be corrupted.

pub mod protocol;
pub mod script;

use crate::config::EngineConfig;
use crate::discover::SourceFragment;
use crate::error::{Error, Result};
use crate::process::{ExecutionRequest, ProcessRunner};

pub use protocol::{CellResult, cell_id, parse_results};
pub use script::{ScriptCell, VISUALIZATIONS, Visualization, prepare_code, synthesize};

/// Ordered cells of one document and the script that runs them.
#[derive(Debug, Clone)]
pub struct ExecutionSession {
    cells: Vec<ScriptCell>,
    script: String,
}

impl ExecutionSession {
    /// Prepare cells from fragments in discovery order.
    pub fn new(fragments: &[SourceFragment]) -> Result<Self> {
        let cells: Vec<ScriptCell> = fragments
            .iter()
            .map(|fragment| {
                let code = prepare_code(&fragment.code);
                let id = cell_id(&code, fragment.ordinal);
                ScriptCell { code, id }
            })
            .collect();
        let script = synthesize(&cells)?;
        Ok(Self { cells, script })
    }

    pub fn cells(&self) -> &[ScriptCell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The synthesized script text.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Run every cell in one interpreter process.
    ///
    /// Returns one result per cell, in cell order. A cell that raised is a
    /// successful run with `success == false`; only failures of the process
    /// or of the side channel are errors.
    pub fn run(&self, runner: &dyn ProcessRunner, config: &EngineConfig) -> Result<Vec<CellResult>> {
        let request = ExecutionRequest::new(&config.interpreter)
            .args(config.interpreter_args.iter().cloned())
            .stdin(self.script.clone())
            .limits(config);

        tracing::info!("Running {} cell(s) in one {} session", self.cells.len(), config.interpreter);
        tracing::debug!("exec: {}", request.command_line());

        let output = runner.run(&request).map_err(|e| match e {
            Error::Spawn { .. } | Error::Timeout { .. } | Error::OutputLimit { .. } => {
                Error::execution(e.to_string())
            }
            other => other,
        })?;

        if !output.success() {
            let status = output
                .status
                .map_or_else(|| "a signal".to_string(), |code| format!("status {}", code));
            return Err(Error::Execution {
                message: format!("{} exited with {}", config.interpreter, status),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let expected: Vec<String> = self.cells.iter().map(|c| c.id.clone()).collect();
        parse_results(&output.stderr, &expected)
    }
}
