//! Error types shared across the crate.
//!
//! Fatal errors (configuration, table persistence) live in [`Error`];
//! per-service launch failures have their own [`LaunchError`] so a batch
//! operation can report one service's failure without aborting its siblings.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the current invocation or operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config file {0} not found")]
    ConfigMissing(PathBuf),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The process table exists but does not parse. Surfaced to the user
    /// as-is; the table is never auto-repaired.
    #[error("process table {path} is corrupt: {source}")]
    DataCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Per-service failures during a launch. Non-fatal to the batch: the
/// controller reports them inline and moves on to the next service.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("project directory {0} does not exist")]
    PathNotFound(PathBuf),

    #[error("no .{extension} project file in {dir}")]
    ProjectFileMissing { dir: PathBuf, extension: String },

    #[error("{count} .{extension} project files in {dir}, expected exactly one")]
    ProjectFileAmbiguous {
        dir: PathBuf,
        extension: String,
        count: usize,
    },

    #[error("invalid toolchain command: {0}")]
    InvalidCommand(String),

    #[error("dependency restore failed (exit {code})")]
    RestoreFailed { code: i32 },

    #[error("build failed (exit {code})")]
    BuildFailed { code: i32 },

    #[error("failed to spawn run command: {0}")]
    SpawnFailed(String),
}
