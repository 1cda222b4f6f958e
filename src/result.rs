//! Execution results.
//!
//! An [`ExecutionResult`] serializes to the flat JSON record the
//! orchestration host expects:
//!
//! ```json
//! {"changed": true, "rc": 0, "start": "...", "end": "...", "delta": "...",
//!  "host": "localhost", "port": "5432", "dbname": "postgres",
//!  "user": "postgres", "msg": "..."}
//! ```
//!
//! with `"failed": true` in place of `"changed": true` on failure.

use chrono::{DateTime, Local, TimeDelta};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::ConnectionParams;
use crate::error::PgScriptError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// How an invocation ended. Exactly one per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The script ran; `msg` carries its standard output.
    Changed,
    /// The script or its execution failed; `msg` carries the error text.
    Failed,
}

impl Outcome {
    /// Returns the JSON key for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Failed => "failed",
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.as_str(), &true)?;
        map.end()
    }
}

/// The record reported back for one script run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub rc: i32,
    #[serde(serialize_with = "serialize_timestamp")]
    pub start: DateTime<Local>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end: DateTime<Local>,
    #[serde(serialize_with = "serialize_delta")]
    pub delta: TimeDelta,
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub user: String,
    pub msg: String,
}

impl ExecutionResult {
    /// Builds a result, echoing the connection fields from `params`.
    ///
    /// Trailing line terminators are stripped from `msg`.
    pub fn new(
        outcome: Outcome,
        rc: i32,
        start: DateTime<Local>,
        end: DateTime<Local>,
        params: &ConnectionParams,
        msg: &str,
    ) -> Self {
        Self {
            outcome,
            rc,
            start,
            end,
            delta: end - start,
            host: params.host.clone(),
            port: params.port.clone(),
            dbname: params.dbname.clone(),
            user: params.user.clone(),
            msg: trim_line_endings(msg).to_string(),
        }
    }

    /// Builds a failed result for an error hit before the client could run.
    ///
    /// `rc` is the OS error number behind `err`, or `-1`.
    pub fn setup_failure(params: &ConnectionParams, err: &PgScriptError) -> Self {
        let now = Local::now();
        let rc = err.os_error().unwrap_or(-1);
        Self::new(Outcome::Failed, rc, now, now, params, &err.to_string())
    }

    /// Returns true when the script ran and was classified as changed.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Changed
    }

    /// Process exit status for the host: 0 when changed, 1 when failed.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            Outcome::Changed => 0,
            Outcome::Failed => 1,
        }
    }

    /// Serializes the result as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Strips every trailing `\r` and `\n`, leaving other whitespace alone.
pub fn trim_line_endings(s: &str) -> &str {
    s.trim_end_matches(['\r', '\n'])
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

fn serialize_delta<S: Serializer>(delta: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_delta(delta))
}

/// Formats a duration as `H:MM:SS.ffffff`.
pub fn format_delta(delta: &TimeDelta) -> String {
    let sign = if *delta < TimeDelta::zero() { "-" } else { "" };
    let delta = delta.abs();
    let total_secs = delta.num_seconds();
    let micros = (delta - TimeDelta::seconds(total_secs))
        .num_microseconds()
        .unwrap_or(0);

    format!(
        "{sign}{}:{:02}:{:02}.{:06}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        micros
    )
}
