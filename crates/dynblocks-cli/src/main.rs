//! dynblocks CLI - run dynamic code blocks embedded in documents.

mod colors;
mod run;
mod script;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dynblocks")]
#[command(about = "Execute dynamic code blocks in documents and embed their output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every dynamic block and write the spliced document
    Run {
        /// Path to the document (.json)
        document: PathBuf,

        /// Output path for the spliced document (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write an HTML preview
        #[arg(long)]
        html: Option<PathBuf>,

        /// Engine config file (.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Interpreter for Python blocks
        #[arg(long)]
        interpreter: Option<String>,

        /// Timeout per external process, in seconds (0 disables it)
        #[arg(long)]
        timeout: Option<u64>,

        /// Directory for compiled sources and build files
        #[arg(long)]
        source_root: Option<PathBuf>,

        /// Fail when any block reports an error
        #[arg(long)]
        strict: bool,
    },

    /// Print the session script without running anything
    Script {
        /// Path to the document (.json)
        document: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format dynblocks-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<dynblocks_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Run {
            document,
            output,
            html,
            config,
            interpreter,
            timeout,
            source_root,
            strict,
        } => {
            let options = run::RunOptions {
                output,
                html,
                config,
                interpreter,
                timeout,
                source_root,
                strict,
            };
            run::execute(&document, &options).map_err(format_error)?;
        }

        Commands::Script { document } => {
            script::execute(&document).map_err(format_error)?;
        }
    }

    Ok(())
}
