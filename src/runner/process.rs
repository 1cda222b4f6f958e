//! Child-process execution.

use super::{Invocation, ProcessOutput, ProcessRunner};
use crate::error::{PgScriptError, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs invocations as real child processes, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Only this child sees these; the parent environment is left alone.
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .map_err(|e| PgScriptError::spawn(&invocation.program, e))?;

        let rc = output.status.code().unwrap_or(-1);
        debug!(program = %invocation.program, rc, "client exited");

        Ok(ProcessOutput {
            rc,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
