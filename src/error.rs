//! Error types for pgscript.
//!
//! Setup problems (bad arguments, unreadable files, a client that cannot be
//! spawned) are errors. A script that runs and reports `ERROR` is not; that
//! is a failed [`crate::result::ExecutionResult`].

use thiserror::Error;

/// Main error type for pgscript operations.
#[derive(Error, Debug)]
pub enum PgScriptError {
    /// Configuration errors (missing `sql`, invalid connection string, bad config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors (temporary script file, argument file, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external client could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PgScriptError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a spawn error for the given program.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Spawn { .. } => "Execution Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the OS error number behind this error, if there is one.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Self::Io(e) | Self::Spawn { source: e, .. } => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Result type alias using PgScriptError.
pub type Result<T> = std::result::Result<T, PgScriptError>;
