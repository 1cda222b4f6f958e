//! SQL script execution through the `psql` client.
//!
//! [`SqlRunner::run`] writes the script to a temporary file, invokes the
//! client with `-h -p -U -d -f` plus any extra options, classifies the
//! outcome and returns an [`ExecutionResult`]. Process spawning sits behind
//! the [`ProcessRunner`] trait so tests can substitute a mock.

mod mock;
mod process;

pub use mock::{MockProcessRunner, RecordedCall};
pub use process::SystemProcessRunner;

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::ConnectionParams;
use crate::error::{PgScriptError, Result};
use crate::result::{ExecutionResult, Outcome};
use crate::script::ScriptFile;

/// Environment variable the client reads its password from.
pub const PASSWORD_ENV: &str = "PGPASSWORD";

/// Marker whose presence on stderr means the script failed.
pub const ERROR_MARKER: &str = "ERROR";

/// Position of `-f` in the arguments built by [`build_args`].
const SCRIPT_FLAG_INDEX: usize = 8;

/// A fully-built child-process invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Environment set only for the child.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Returns the script path at its fixed `-f <path>` position, if any.
    pub fn script_path(&self) -> Option<&str> {
        match self.args.get(SCRIPT_FLAG_INDEX) {
            Some(flag) if flag == "-f" => self.args.get(SCRIPT_FLAG_INDEX + 1).map(String::as_str),
            _ => None,
        }
    }

    /// Returns the value of a child environment variable.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env_keys)
            .finish()
    }
}

/// Exit code and captured streams of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a built invocation to completion.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// How a finished client run is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationMode {
    /// Failed iff stderr contains `ERROR`; the exit code is ignored.
    #[default]
    Legacy,
    /// Failed if stderr contains `ERROR` or the exit code is non-zero.
    Strict,
}

/// Decides the outcome of a finished client run.
pub fn classify(mode: ClassificationMode, output: &ProcessOutput) -> Outcome {
    let error_reported = output.stderr.contains(ERROR_MARKER);
    let failed = match mode {
        ClassificationMode::Legacy => error_reported,
        ClassificationMode::Strict => error_reported || output.rc != 0,
    };

    if failed {
        Outcome::Failed
    } else {
        Outcome::Changed
    }
}

/// Builds the client arguments: connection flags, `-f <script>`, then
/// `options` in the order given. The password is never among them.
pub fn build_args(params: &ConnectionParams, script_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-h".to_string(),
        params.host.clone(),
        "-p".to_string(),
        params.port.clone(),
        "-U".to_string(),
        params.user.clone(),
        "-d".to_string(),
        params.dbname.clone(),
        "-f".to_string(),
        script_path.to_string_lossy().into_owned(),
    ];
    args.extend(params.options.iter().cloned());
    args
}

/// Runs SQL scripts through an external client.
pub struct SqlRunner<R: ProcessRunner = SystemProcessRunner> {
    runner: R,
    client: String,
    mode: ClassificationMode,
}

impl SqlRunner<SystemProcessRunner> {
    /// Creates a runner that spawns `psql` from `PATH`.
    pub fn new() -> Self {
        Self::with_runner(SystemProcessRunner)
    }
}

impl Default for SqlRunner<SystemProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ProcessRunner> SqlRunner<R> {
    /// Creates a runner on top of the given process runner.
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            client: "psql".to_string(),
            mode: ClassificationMode::default(),
        }
    }

    /// Sets the client binary name or path.
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Sets the classification mode.
    pub fn mode(mut self, mode: ClassificationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the underlying process runner.
    pub fn process_runner(&self) -> &R {
        &self.runner
    }

    /// Builds the client invocation for `params` reading `script_path`.
    ///
    /// A non-empty password goes into the child's environment only.
    pub fn build_invocation(&self, params: &ConnectionParams, script_path: &Path) -> Invocation {
        let mut env = Vec::new();
        if !params.password.is_empty() {
            env.push((PASSWORD_ENV.to_string(), params.password.clone()));
        }

        Invocation {
            program: self.client.clone(),
            args: build_args(params, script_path),
            env,
        }
    }

    /// Runs the script described by `params` and reports the outcome.
    ///
    /// Never returns an error: setup and spawn problems become failed
    /// results. The temporary script file is gone when this returns.
    pub fn run(&self, params: &ConnectionParams) -> ExecutionResult {
        info!(conn = %params.display_string(), "running script");

        let start = Local::now();
        let result = match self.execute(params) {
            Ok((start, end, output)) => {
                let outcome = classify(self.mode, &output);
                let msg = match outcome {
                    Outcome::Changed => &output.stdout,
                    Outcome::Failed => &output.stderr,
                };
                ExecutionResult::new(outcome, output.rc, start, end, params, msg)
            }
            Err(e) => {
                let end = Local::now();
                let rc = e.os_error().unwrap_or(-1);
                ExecutionResult::new(Outcome::Failed, rc, start, end, params, &e.to_string())
            }
        };

        if result.is_success() {
            info!(rc = result.rc, delta = ?result.delta, "script finished");
        } else {
            warn!(rc = result.rc, msg = %result.msg, "script failed");
        }
        result
    }

    fn execute(
        &self,
        params: &ConnectionParams,
    ) -> Result<(DateTime<Local>, DateTime<Local>, ProcessOutput)> {
        params.validate()?;

        let script = ScriptFile::create(&params.sql)?;
        let invocation = self.build_invocation(params, script.path());
        debug!(?invocation, "invoking client");

        let start = Local::now();
        let output = self.runner.run(&invocation)?;
        let end = Local::now();

        Ok((start, end, output))
    }
}

impl<R: ProcessRunner> fmt::Debug for SqlRunner<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlRunner")
            .field("client", &self.client)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Returns an error when the client is clearly unusable.
pub fn check_client(client: &str) -> Result<()> {
    if client.trim().is_empty() {
        return Err(PgScriptError::config("client binary must not be empty"));
    }
    Ok(())
}
