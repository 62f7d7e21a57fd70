//! Engine pass over one document.
//!
//! ```text
//! marker check ──► build files ──► session strategy ──► compiled strategy
//!                      │                 │                     │
//!                  write only     one interpreter       one build + runs
//!                                 process for all       per fragment
//! ```
//!
//! Every component receives the [`EngineContext`] explicitly; diagnostics
//! that do not abort the pass are collected in the returned
//! [`ConversionReport`].

use crate::cache::ResultCache;
use crate::compile::{CompileRunner, Stage, write_build_file};
use crate::config::EngineConfig;
use crate::discover::{SourceFragment, discover, is_enabled};
use crate::document::DocumentHost;
use crate::error::Result;
use crate::paths::DocumentDirs;
use crate::policy::ErrorPolicy;
use crate::process::ProcessRunner;
use crate::session::ExecutionSession;
use crate::splice::insert_after;
use crate::transform::{compiled_nodes, session_result};

/// Per-pass context handed to every component.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub config: &'a EngineConfig,
    pub runner: &'a dyn ProcessRunner,
}

/// A failure contained to one compiled fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentError {
    pub fragment: String,
    pub stage: Stage,
    pub message: String,
}

/// Outcome of one engine pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// False when the document marker was absent and nothing ran.
    pub enabled: bool,
    pub build_files: usize,
    pub session_cells: usize,
    pub compiled_fragments: usize,
    /// Output nodes spliced into the document.
    pub inserted: usize,
    pub warnings: Vec<String>,
    pub fragment_errors: Vec<FragmentError>,
}

impl ConversionReport {
    /// No warnings and no contained errors.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.fragment_errors.is_empty()
    }
}

/// Runs every strategy over a document.
///
/// # Example
///
/// ```
/// use dynblocks_core::{Document, Engine, EngineConfig, SystemRunner};
///
/// let mut doc = Document::new("notes.adoc");
/// let config = EngineConfig::default();
/// let runner = SystemRunner::new();
///
/// // Without the `dynamic-blocks` attribute nothing runs.
/// let report = Engine::new(&config, &runner).process(&mut doc).unwrap();
/// assert!(!report.enabled);
/// ```
pub struct Engine<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a EngineConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            ctx: EngineContext { config, runner },
        }
    }

    pub fn context(&self) -> EngineContext<'a> {
        self.ctx
    }

    /// Execute all dynamic fragments and splice their output into `doc`.
    ///
    /// Fatal errors abort the pass and leave the document partially spliced;
    /// callers must not emit it.
    pub fn process<D: DocumentHost + ?Sized>(&self, doc: &mut D) -> Result<ConversionReport> {
        let mut report = ConversionReport::default();

        if self.ctx.config.require_marker && !is_enabled(doc) {
            tracing::info!("{}: dynamic blocks disabled, skipping", doc.name());
            return Ok(report);
        }
        report.enabled = true;
        tracing::info!("Processing dynamic blocks in {}", doc.name());

        self.write_build_files(doc, &mut report);
        self.run_session(doc, &mut report)?;
        self.run_compiled(doc, &mut report)?;

        Ok(report)
    }

    /// The session that [`Engine::process`] would run, without running it.
    pub fn session<D: DocumentHost + ?Sized>(&self, doc: &D) -> Result<ExecutionSession> {
        let fragments = discover(doc, &self.ctx.config.session_languages);
        ExecutionSession::new(&fragments)
    }

    fn write_build_files<D: DocumentHost + ?Sized>(&self, doc: &D, report: &mut ConversionReport) {
        let fragments = discover(doc, &self.ctx.config.build_file_languages);
        if fragments.is_empty() {
            return;
        }

        let dirs = match DocumentDirs::create(&self.ctx.config.source_root, doc.name()) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::error!("Failed to create source directory: {}", e);
                report.warnings.push(format!("failed to write build files: {}", e));
                return;
            }
        };

        // Each build file stands alone; one failed write does not stop the rest.
        for fragment in &fragments {
            match write_build_file(&dirs, fragment) {
                Ok(_) => report.build_files += 1,
                Err(e) => {
                    tracing::error!("Failed to write build file for {}: {}", fragment.label(), e);
                    report
                        .warnings
                        .push(format!("failed to write build file for {}: {}", fragment.label(), e));
                }
            }
        }
    }

    fn run_session<D: DocumentHost + ?Sized>(
        &self,
        doc: &mut D,
        report: &mut ConversionReport,
    ) -> Result<()> {
        let fragments = discover(doc, &self.ctx.config.session_languages);
        if fragments.is_empty() {
            return Ok(());
        }

        let session = ExecutionSession::new(&fragments)?;
        let results = session.run(self.ctx.runner, self.ctx.config)?;
        let cache = ResultCache::for_document(doc, &self.ctx.config.default_cache_dir);

        for (fragment, result) in fragments.iter().zip(&results) {
            if let Some(cache) = &cache
                && let Err(e) = cache.store(result)
            {
                tracing::error!("Failed to cache {}: {}", result.id, e);
                report.warnings.push(format!("failed to cache {}: {}", result.id, e));
            }

            if !result.success {
                ErrorPolicy::for_fragment(&fragment.options).on_cell_failure(result)?;
                tracing::warn!("Execution is unsuccessful! {}", result.stdout);
                report
                    .warnings
                    .push(format!("{} failed: {}", fragment.label(), result.failure_output().trim()));
            }

            let transformed = session_result(fragment, result);
            report.warnings.extend(transformed.warning);
            report.inserted += insert_after(doc, fragment.node, vec![transformed.node])?.len();
            report.session_cells += 1;
        }

        Ok(())
    }

    fn run_compiled<D: DocumentHost + ?Sized>(
        &self,
        doc: &mut D,
        report: &mut ConversionReport,
    ) -> Result<()> {
        let fragments = discover(doc, &self.ctx.config.compiled_languages);
        if fragments.is_empty() {
            return Ok(());
        }

        let dirs = DocumentDirs::create(&self.ctx.config.source_root, doc.name())?;
        let compiler = CompileRunner::new(self.ctx.runner, self.ctx.config, &dirs);

        for fragment in &fragments {
            let Some(compiled) = compiler.process(fragment)? else {
                report.warnings.push(skipped(fragment));
                continue;
            };

            if let Some(failure) = &compiled.failure {
                report.fragment_errors.push(FragmentError {
                    fragment: fragment.label(),
                    stage: failure.stage,
                    message: failure.error.to_string(),
                });
            }
            report.inserted += insert_after(doc, fragment.node, compiled_nodes(fragment, &compiled))?.len();
            report.compiled_fragments += 1;
        }

        Ok(())
    }
}

fn skipped(fragment: &SourceFragment) -> String {
    format!(
        "{} skipped: unknown compile strategy `{}`",
        fragment.label(),
        fragment.options.compile.as_deref().unwrap_or_default()
    )
}
