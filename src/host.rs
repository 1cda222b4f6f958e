//! Orchestration host integration.
//!
//! The host hands over a JSON argument file and reads one JSON result line
//! from stdout. Argument files come either flat (`{"sql": ...}`) or wrapped
//! in an `ANSIBLE_MODULE_ARGS` object.

use crate::config::ConnectionParams;
use crate::error::{PgScriptError, Result};
use crate::result::ExecutionResult;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

const WRAPPER_KEY: &str = "ANSIBLE_MODULE_ARGS";

/// Loads connection parameters from a JSON argument file.
pub fn load_args_file(path: &Path) -> Result<ConnectionParams> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PgScriptError::config(format!(
            "Failed to read arguments file {}: {e}",
            path.display()
        ))
    })?;
    parse_args(&content)
}

/// Parses connection parameters from the text of an argument file.
pub fn parse_args(content: &str) -> Result<ConnectionParams> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| PgScriptError::config(format!("Arguments are not valid JSON: {e}")))?;

    let args = match value {
        Value::Object(mut map) => match map.remove(WRAPPER_KEY) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        _ => return Err(PgScriptError::config("Arguments must be a JSON object")),
    };

    ConnectionParams::from_json(args)
}

/// Writes `result` as one JSON line.
pub fn emit<W: Write>(result: &ExecutionResult, pretty: bool, mut out: W) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .map_err(|e| PgScriptError::internal(format!("Failed to serialize result: {e}")))?;

    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}
