//! Script command implementation for the dynblocks CLI.
//!
//! Prints the session script a document would run, without running it.

use std::path::Path;

use dynblocks_core::{Engine, EngineConfig, SystemRunner, is_enabled};

use crate::colors;
use crate::run::load_document;

/// Print the synthesized session script.
pub fn execute(document_path: &Path) -> anyhow::Result<()> {
    let doc = load_document(document_path)?;
    let config = EngineConfig::default();
    let runner = SystemRunner::new();

    let session = Engine::new(&config, &runner).session(&doc)?;

    if !is_enabled(&doc) {
        eprintln!(
            "{}note:{} document has no `dynamic-blocks` attribute; `run` would skip it",
            colors::YELLOW,
            colors::RESET
        );
    }
    if session.is_empty() {
        eprintln!("No dynamic Python blocks found.");
        return Ok(());
    }

    for cell in session.cells() {
        eprintln!("{}cell{} {}", colors::BOLD, colors::RESET, cell.id);
    }
    print!("{}", session.script());
    Ok(())
}
