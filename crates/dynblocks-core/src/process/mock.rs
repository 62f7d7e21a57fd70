//! Scripted process runner for tests and dry runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ExecutionRequest, ProcessOutput, ProcessRunner};
use crate::error::{Error, Result};

type Handler = Box<dyn Fn(&ExecutionRequest) -> Result<ProcessOutput> + Send + Sync>;

/// A [`ProcessRunner`] that records every request and answers from a script.
///
/// Queued outputs are consumed first; once the queue is empty the handler (if
/// any) answers, otherwise the call succeeds with empty output.
#[derive(Default)]
pub struct MockRunner {
    queued: Mutex<VecDeque<Result<ProcessOutput>>>,
    handler: Option<Handler>,
    calls: Mutex<Vec<ExecutionRequest>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unqueued call with `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&ExecutionRequest) -> Result<ProcessOutput> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    /// Queue a successful exit with the given streams.
    pub fn push_success(&self, stdout: &str, stderr: &str) -> &Self {
        self.push(Ok(ProcessOutput {
            status: Some(0),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }))
    }

    /// Queue a failing exit.
    pub fn push_failure(&self, status: i32, stdout: &str, stderr: &str) -> &Self {
        self.push(Ok(ProcessOutput {
            status: Some(status),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }))
    }

    /// Queue a spawn failure.
    pub fn push_spawn_error(&self, program: &str) -> &Self {
        self.push(Err(Error::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        }))
    }

    fn push(&self, response: Result<ProcessOutput>) -> &Self {
        self.queued
            .lock()
            .expect("mock queue poisoned")
            .push_back(response);
        self
    }

    /// Every request seen so far.
    pub fn calls(&self) -> Vec<ExecutionRequest> {
        self.calls.lock().expect("mock calls poisoned").clone()
    }

    /// Command lines of every request seen so far.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ExecutionRequest::command_line).collect()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, request: &ExecutionRequest) -> Result<ProcessOutput> {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .push(request.clone());

        if let Some(response) = self.queued.lock().expect("mock queue poisoned").pop_front() {
            return response;
        }
        match &self.handler {
            Some(handler) => handler(request),
            None => Ok(ProcessOutput {
                status: Some(0),
                ..Default::default()
            }),
        }
    }
}
