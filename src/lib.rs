//! devrack: a local development process supervisor.
//!
//! Builds, launches, monitors, and terminates a fixed set of externally
//! defined build-and-run projects, tracking them via process identifiers
//! persisted across invocations. There is no daemon: each invocation loads
//! the configured service registry and the persisted process table,
//! performs one operation, and persists the table before exiting. Launched
//! services are detached OS processes that outlive the tool.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod launcher;
pub mod output;
pub mod probe;
pub mod prompt;
pub mod table;

pub use error::{Error, LaunchError, Result};
