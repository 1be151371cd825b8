//! Configuration management for devrack.
//!
//! This module defines the structure of the `devrack.toml` configuration file
//! and provides functionality to load, parse, and validate it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration structure corresponding to `devrack.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory that receives per-service log files.
    pub log_dir: PathBuf,
    /// Path of the persisted process table.
    pub pid_file: PathBuf,
    /// Commands used to update, restore, build, and run each project.
    #[serde(default)]
    pub toolchain: Toolchain,
    /// List of services to supervise.
    #[serde(rename = "service", default)]
    pub services: Vec<ServiceConfig>,
}

/// Configuration for a single service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Display name of the service; unique across the config.
    pub name: String,
    /// Absolute path of the buildable project directory.
    pub path: PathBuf,
    /// Color for the service name in output. Presentation only.
    pub color: Option<String>,
}

/// The build-and-run command set shared by all services.
///
/// Defaults model the dotnet workflow; each field is a full command line,
/// split with shell rules before execution.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// Source-update command, run only when updates are requested.
    pub update: String,
    /// Dependency-restore command.
    pub restore: String,
    /// Build command.
    pub build: String,
    /// Run command, spawned detached.
    pub run: String,
    /// File extension of the recognized project file (without the dot).
    pub project_extension: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            update: "git pull".to_string(),
            restore: "dotnet restore".to_string(),
            build: "dotnet build".to_string(),
            run: "dotnet run".to_string(),
            project_extension: "csproj".to_string(),
        }
    }
}

/// Loads, parses, and validates the configuration from a file path.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::ConfigMissing(path.to_path_buf())
        } else {
            Error::Io(err)
        }
    })?;
    let config: Config = toml::from_str(&raw)
        .map_err(|err| Error::ConfigInvalid(format!("{}: {}", path.display(), err)))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.services.is_empty() {
        return Err(Error::ConfigInvalid("no services defined".to_string()));
    }
    let mut seen = HashSet::new();
    for service in &config.services {
        if service.name.trim().is_empty() {
            return Err(Error::ConfigInvalid("service with empty name".to_string()));
        }
        if !seen.insert(service.name.clone()) {
            return Err(Error::ConfigInvalid(format!(
                "duplicate service name: {}",
                service.name
            )));
        }
        if !service.path.is_absolute() {
            return Err(Error::ConfigInvalid(format!(
                "service {} has a non-absolute path: {}",
                service.name,
                service.path.display()
            )));
        }
    }
    Ok(())
}
