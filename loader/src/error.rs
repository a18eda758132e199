// src/error.rs

//! Error taxonomy of a loader run.
//!
//! Every component returns `Result<_, Error>`; the orchestrator stops at the
//! first failure and turns it into a single status line. Device problems are
//! not errors here: they are reported through `CommandOutcome`.

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias using the loader error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /*────────── configuration store ─────────*/
    #[error("Cannot open registry key {path}: {source}")]
    KeyOpen { path: String, #[source] source: io::Error },

    #[error("Cannot create/open registry key {path}: {source}")]
    KeyCreate { path: String, #[source] source: io::Error },

    #[error("Cannot query registry value {name}: {source}")]
    ValueQuery { name: String, #[source] source: io::Error },

    #[error("Cannot write registry value {name}: {source}")]
    ValueWrite { name: String, #[source] source: io::Error },

    /*────────── patch table acquisition ─────────*/
    #[error("Error reading file {path}: {source}")]
    TableRead { path: PathBuf, #[source] source: io::Error },

    #[error("Patch table {path} has invalid size {size} (expected 1..={max} bytes)")]
    TableSize { path: PathBuf, size: u64, max: u64 },

    #[error("Patch table {0} is empty")]
    TableEmpty(PathBuf),

    #[error("Cannot stage {from} to {to}: {source}")]
    Stage { from: PathBuf, to: PathBuf, #[source] source: io::Error },

    #[error("Patch compiler failed: {0}")]
    Compiler(String),

    /*────────── host / driver ─────────*/
    #[error("This operation system version ({0}.x) is not supported")]
    UnsupportedOs(u32),

    #[error("{0} is running, close it before")]
    TargetRunning(String),

    #[error("Cannot enumerate processes: {0}")]
    ProcessQuery(#[source] io::Error),

    #[error("Failed to load {service} monitor driver: {source}")]
    DriverLoad { service: String, #[source] source: io::Error },

    #[error("Instance counter unavailable: {0}")]
    Counter(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
