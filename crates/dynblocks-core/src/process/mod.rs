//! External execution gateway.
//!
//! Every interpreter session, compiler and compiled program goes through a
//! [`ProcessRunner`]. The production runner is [`SystemRunner`]; tests use the
//! scripted runner from the `mock-process` feature.
//!
//! Invocations are synchronous: the caller blocks until the process exits,
//! times out, or overflows the output buffer.

#[cfg(any(test, feature = "mock-process"))]
mod mock;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_MAX_BUFFER, EngineConfig};
use crate::error::{Error, Result};

#[cfg(any(test, feature = "mock-process"))]
pub use mock::MockRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Program name (resolved on PATH) or path.
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; inherits the current one when absent.
    pub cwd: Option<PathBuf>,
    /// Text written to the process's stdin.
    pub stdin: Option<String>,
    /// Maximum captured bytes per stream.
    pub max_buffer: usize,
    pub timeout: Option<Duration>,
}

impl ExecutionRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
            max_buffer: DEFAULT_MAX_BUFFER,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Apply buffer and timeout limits from the engine config.
    pub fn limits(mut self, config: &EngineConfig) -> Self {
        self.max_buffer = config.max_buffer_bytes;
        self.timeout = config.timeout();
        self
    }

    /// Human-readable command line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external processes.
pub trait ProcessRunner {
    /// Run one process to completion.
    ///
    /// A non-zero exit is not an error here; callers decide what it means.
    fn run(&self, request: &ExecutionRequest) -> Result<ProcessOutput>;
}

/// Runs real processes with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a bare program name on PATH; paths are used as given.
    fn resolve(program: &str) -> Result<PathBuf> {
        let path = Path::new(program);
        if path.components().count() > 1 || path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        which::which(program).map_err(|e| Error::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        })
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, request: &ExecutionRequest) -> Result<ProcessOutput> {
        let program = Self::resolve(&request.program)?;
        tracing::debug!("exec: {}", request.command_line());

        let mut cmd = Command::new(&program);
        cmd.args(&request.args)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &request.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: request.program.clone(),
            source,
        })?;

        let overflowed = Arc::new(AtomicBool::new(false));
        let stdout = spawn_reader(child.stdout.take(), request.max_buffer, overflowed.clone());
        let stderr = spawn_reader(child.stderr.take(), request.max_buffer, overflowed.clone());
        let writer = request.stdin.clone().and_then(|input| {
            child.stdin.take().map(|mut pipe| {
                thread::spawn(move || {
                    // A child that exits without reading stdin closes the pipe.
                    let _ = pipe.write_all(input.as_bytes());
                })
            })
        });

        let started = Instant::now();
        let status = loop {
            if overflowed.load(Ordering::SeqCst) {
                kill(&mut child);
                return Err(Error::OutputLimit {
                    program: request.program.clone(),
                    limit: request.max_buffer,
                });
            }
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Some(timeout) = request.timeout
                && started.elapsed() >= timeout
            {
                kill(&mut child);
                return Err(Error::Timeout {
                    program: request.program.clone(),
                    timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let stdout = join_reader(stdout)?;
        let stderr = join_reader(stderr)?;

        if overflowed.load(Ordering::SeqCst) {
            return Err(Error::OutputLimit {
                program: request.program.clone(),
                limit: request.max_buffer,
            });
        }

        Ok(ProcessOutput {
            status: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

type Reader = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn spawn_reader<R>(pipe: Option<R>, limit: usize, overflowed: Arc<AtomicBool>) -> Reader
where
    R: Read + Send + 'static,
{
    pipe.map(|pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
            pipe.take(cap).read_to_end(&mut buf)?;
            if buf.len() > limit {
                overflowed.store(true, Ordering::SeqCst);
                buf.truncate(limit);
            }
            Ok(buf)
        })
    })
}

fn join_reader(reader: Reader) -> Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| Error::execution("output reader thread panicked"))?
            .map_err(Error::from),
        None => Ok(Vec::new()),
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
