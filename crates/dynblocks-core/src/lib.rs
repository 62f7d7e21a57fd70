//! Core engine for dynamic document blocks.
//!
//! This crate provides:
//! - Fragment discovery over a host document tree
//! - A shared interpreter session for Python fragments (IPython)
//! - Build-and-run of C/C++ fragments with several build strategies
//! - Output transformation (literal, Plotly, PyVista) and splicing
//! - An audit cache of session results

pub mod cache;
pub mod compile;
pub mod config;
pub mod discover;
pub mod document;
pub mod engine;
pub mod error;
pub mod options;
pub mod paths;
pub mod policy;
pub mod process;
pub mod session;
pub mod splice;
pub mod transform;

pub use cache::ResultCache;
pub use compile::{CompileRunner, CompileStrategy, CompiledFragment, Stage};
pub use config::EngineConfig;
pub use discover::{SourceFragment, discover, is_enabled};
pub use document::{Block, Document, DocumentHost, DocumentSource, ListingBlock, NodeId, OutputNode};
pub use engine::{ConversionReport, Engine, EngineContext, FragmentError};
pub use error::{Error, Result};
pub use options::{DeclaredOutput, FragmentOptions};
pub use paths::DocumentDirs;
pub use policy::ErrorPolicy;
#[cfg(any(test, feature = "mock-process"))]
pub use process::MockRunner;
pub use process::{ExecutionRequest, ProcessOutput, ProcessRunner, SystemRunner};
pub use session::{CellResult, ExecutionSession};
pub use transform::OutputKind;
