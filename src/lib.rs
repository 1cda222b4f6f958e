//! pgscript - run SQL scripts through the `psql` client.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod result;
pub mod runner;
pub mod script;
