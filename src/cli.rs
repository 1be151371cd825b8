//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "devrack",
    version,
    about = "Build, launch, and track local development services"
)]
pub struct Cli {
    /// Path to devrack.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Source-update behavior for start operations.
    #[arg(long, value_enum, default_value = "ask")]
    pub update: UpdateMode,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Whether start operations pull latest sources first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UpdateMode {
    /// Always run the source-update command.
    On,
    /// Never run the source-update command.
    Off,
    /// Ask before each start operation.
    Ask,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
    /// Build and start every configured service.
    Start,
    /// Build and start a selected subset of services.
    StartOne,
    /// Stop every tracked service.
    Stop,
    /// Stop a selected subset of tracked services.
    StopOne,
    /// Show liveness and resource usage of tracked services.
    Status,
    /// Stop everything, then start everything.
    Restart,
}
