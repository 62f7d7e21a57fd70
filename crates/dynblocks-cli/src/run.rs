//! Run command implementation for the dynblocks CLI.
//!
//! Executes every dynamic block of a document and writes the spliced result.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use dynblocks_core::document::html;
use dynblocks_core::{ConversionReport, Document, Engine, EngineConfig, SystemRunner};

use crate::colors;

/// Flags of the `run` command.
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub interpreter: Option<String>,
    pub timeout: Option<u64>,
    pub source_root: Option<PathBuf>,
    pub strict: bool,
}

/// Load a document from its JSON form.
pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Document not found: {}", path.display()))?;
    Ok(Document::from_json(&json)?)
}

/// Build the engine config from the config file and flag overrides.
fn load_config(document: &Path, options: &RunOptions) -> anyhow::Result<EngineConfig> {
    let mut config = match &options.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::for_document_root(document.parent().unwrap_or(Path::new(""))),
    };

    if let Some(interpreter) = &options.interpreter {
        config.interpreter = interpreter.clone();
    }
    if let Some(secs) = options.timeout {
        config.timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(root) = &options.source_root {
        config.source_root = root.clone();
    }
    Ok(config)
}

/// Execute a document.
pub fn execute(document_path: &Path, options: &RunOptions) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut doc = load_document(document_path)?;
    let config = load_config(document_path, options)?;
    let runner = SystemRunner::new();

    let report = Engine::new(&config, &runner).process(&mut doc)?;

    let json = doc.to_json_pretty()?;
    match &options.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    if let Some(path) = &options.html {
        fs::write(path, html::render(&doc))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    print_summary(&report, start.elapsed().as_secs_f64());

    if options.strict && !report.fragment_errors.is_empty() {
        anyhow::bail!(
            "{} block(s) failed; see the embedded error output",
            report.fragment_errors.len()
        );
    }
    Ok(())
}

/// Summary goes to stderr; stdout may carry the document.
fn print_summary(report: &ConversionReport, secs: f64) {
    if !report.enabled {
        eprintln!(
            "{}Dynamic blocks disabled{} (add the `dynamic-blocks` document attribute)",
            colors::YELLOW,
            colors::RESET
        );
        return;
    }

    for warning in &report.warnings {
        eprintln!("{}warning:{} {}", colors::YELLOW, colors::RESET, warning);
    }
    for error in &report.fragment_errors {
        eprintln!(
            "{}{}:{} {}: {}",
            colors::RED,
            error.stage.title(),
            colors::RESET,
            error.fragment,
            error.message
        );
    }

    eprintln!(
        "{}Completed{} {} session cell(s), {} compiled block(s), {} build file(s) in {:.2}s",
        colors::GREEN,
        colors::RESET,
        report.session_cells,
        report.compiled_fragments,
        report.build_files,
        secs
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RunOptions {
        RunOptions {
            output: None,
            html: None,
            config: None,
            interpreter: None,
            timeout: None,
            source_root: None,
            strict: false,
        }
    }

    #[test]
    fn test_config_overrides() {
        let mut opts = options();
        opts.interpreter = Some("python3.12".to_string());
        opts.timeout = Some(0);
        let config = load_config(Path::new("/docs/guide.json"), &opts).unwrap();

        assert_eq!(config.interpreter, "python3.12");
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.source_root, PathBuf::from("/docs/cpp"));
    }

    #[test]
    fn test_source_root_override() {
        let mut opts = options();
        opts.source_root = Some(PathBuf::from("/tmp/build"));
        opts.timeout = Some(30);
        let config = load_config(Path::new("guide.json"), &opts).unwrap();

        assert_eq!(config.source_root, PathBuf::from("/tmp/build"));
        assert_eq!(config.timeout_secs, Some(30));
    }
}
