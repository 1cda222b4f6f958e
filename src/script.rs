//! Temporary script files.
//!
//! The client reads the script from disk via `-f`, so the SQL is written to
//! a uniquely-named temporary file that lives exactly as long as the
//! [`ScriptFile`] value. Dropping it removes the file, whichever way the
//! caller leaves the scope.

use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A SQL script persisted to a temporary file.
#[derive(Debug)]
pub struct ScriptFile {
    file: NamedTempFile,
}

impl ScriptFile {
    /// Writes `sql` to a fresh temporary file and syncs it to storage.
    pub fn create(sql: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("pgscript-")
            .suffix(".sql")
            .tempfile()?;

        file.write_all(sql.as_bytes())?;
        file.flush()?;
        file.as_file().sync_all()?;

        debug!(path = %file.path().display(), bytes = sql.len(), "wrote script file");
        Ok(Self { file })
    }

    /// Path handed to the client.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
