//! Mock process runner for testing.
//!
//! Returns canned output instead of spawning anything and records what it
//! was asked to run, including the script contents at call time.

use super::{Invocation, ProcessOutput, ProcessRunner};
use crate::error::{PgScriptError, Result};
use std::sync::Mutex;

/// What the mock saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub invocation: Invocation,
    /// Contents of the `-f` script file, read while it still existed.
    pub script: Option<String>,
}

/// A process runner that returns a predefined output.
#[derive(Debug)]
pub struct MockProcessRunner {
    response: MockResponse,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone)]
enum MockResponse {
    Output(ProcessOutput),
    SpawnFailure(i32),
}

impl MockProcessRunner {
    /// Creates a mock that exits with `rc` after writing the given streams.
    pub fn new(rc: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::with_response(MockResponse::Output(ProcessOutput {
            rc,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }))
    }

    /// Creates a mock whose client cannot be started, failing with `errno`.
    pub fn spawn_failure(errno: i32) -> Self {
        Self::with_response(MockResponse::SpawnFailure(errno))
    }

    fn with_response(response: MockResponse) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Returns the most recent invocation, if any.
    pub fn last_invocation(&self) -> Option<Invocation> {
        self.calls().pop().map(|call| call.invocation)
    }
}

impl ProcessRunner for MockProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let script = invocation
            .script_path()
            .and_then(|path| std::fs::read_to_string(path).ok());

        self.calls
            .lock()
            .map_err(|_| PgScriptError::internal("mock call log poisoned"))?
            .push(RecordedCall {
                invocation: invocation.clone(),
                script,
            });

        match &self.response {
            MockResponse::Output(output) => Ok(output.clone()),
            MockResponse::SpawnFailure(errno) => Err(PgScriptError::spawn(
                &invocation.program,
                std::io::Error::from_raw_os_error(*errno),
            )),
        }
    }
}
