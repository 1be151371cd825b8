//! Building and launching a single service.
//!
//! The launcher walks one service through its build-and-run sequence:
//! verify the project directory, run the optional source update, restore
//! dependencies, build, then spawn the run command detached with its
//! output redirected to per-service log files. Each step short-circuits on
//! its own failure; a failed source update only warns.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{Config, ServiceConfig, Toolchain};
use crate::error::LaunchError;
use crate::probe;
use crate::table::TrackedProcess;

/// Builds and spawns services according to the configured toolchain.
pub struct ServiceLauncher {
    log_dir: PathBuf,
    toolchain: Toolchain,
}

struct StepFailure {
    code: i32,
}

impl ServiceLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            log_dir: config.log_dir.clone(),
            toolchain: config.toolchain.clone(),
        }
    }

    /// Runs the full launch sequence for one service.
    ///
    /// Side effects (log files, restore/build artifacts, the child
    /// process) are not rolled back when a later step fails; each
    /// service's launch is independent of its siblings.
    pub async fn launch(
        &self,
        service: &ServiceConfig,
        update: bool,
    ) -> Result<TrackedProcess, LaunchError> {
        let dir = &service.path;
        if !dir.is_dir() {
            return Err(LaunchError::PathNotFound(dir.clone()));
        }
        self.check_project_file(dir)?;

        if update {
            println!("  $ {}", self.toolchain.update);
            if let Err(failure) = run_step(&self.toolchain.update, dir).await {
                warn!(
                    service = %service.name,
                    code = failure.code,
                    "source update failed, continuing"
                );
                println!(
                    "  ! source update failed (exit {}), continuing",
                    failure.code
                );
            }
        }

        println!("  $ {}", self.toolchain.restore);
        run_step(&self.toolchain.restore, dir)
            .await
            .map_err(|failure| LaunchError::RestoreFailed { code: failure.code })?;

        println!("  $ {}", self.toolchain.build);
        run_step(&self.toolchain.build, dir)
            .await
            .map_err(|failure| LaunchError::BuildFailed { code: failure.code })?;

        self.spawn_run(service).await
    }

    /// The directory must contain exactly one recognized project file.
    fn check_project_file(&self, dir: &Path) -> Result<(), LaunchError> {
        let extension = &self.toolchain.project_extension;
        let entries = std::fs::read_dir(dir)
            .map_err(|_| LaunchError::PathNotFound(dir.to_path_buf()))?;
        let count = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case(extension.as_str()))
                    .unwrap_or(false)
            })
            .count();
        match count {
            0 => Err(LaunchError::ProjectFileMissing {
                dir: dir.to_path_buf(),
                extension: extension.clone(),
            }),
            1 => Ok(()),
            count => Err(LaunchError::ProjectFileAmbiguous {
                dir: dir.to_path_buf(),
                extension: extension.clone(),
                count,
            }),
        }
    }

    /// Spawns the run command detached from the controlling session, with
    /// stdout and stderr redirected to per-service log files (truncated on
    /// every launch).
    async fn spawn_run(&self, service: &ServiceConfig) -> Result<TrackedProcess, LaunchError> {
        let (cmd, args) = split_command(&self.toolchain.run)?;

        std::fs::create_dir_all(&self.log_dir)
            .map_err(|err| LaunchError::SpawnFailed(err.to_string()))?;
        let stem = sanitize_name(&service.name);
        let log_path = self.log_dir.join(format!("{}.log", stem));
        let err_path = self.log_dir.join(format!("{}.log.err", stem));
        let log_file = std::fs::File::create(&log_path)
            .map_err(|err| LaunchError::SpawnFailed(err.to_string()))?;
        let err_file = std::fs::File::create(&err_path)
            .map_err(|err| LaunchError::SpawnFailed(err.to_string()))?;

        let mut command = Command::new(cmd);
        command.args(args);
        command.current_dir(&service.path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(err_file));

        #[cfg(windows)]
        {
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            const DETACHED_PROCESS: u32 = 0x00000008;
            command.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
        }

        #[cfg(unix)]
        unsafe {
            command.pre_exec(|| {
                let _ = libc::setpgid(0, 0);
                Ok(())
            });
        }

        let child = command
            .spawn()
            .map_err(|err| LaunchError::SpawnFailed(err.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| LaunchError::SpawnFailed("process exited before pid capture".to_string()))?;
        // The child is intentionally dropped without waiting: it outlives
        // this invocation.
        drop(child);

        let started_at = probe::start_time(pid);
        debug!(service = %service.name, pid, "spawned run command");

        Ok(TrackedProcess {
            name: service.name.clone(),
            pid,
            working_directory: service.path.display().to_string(),
            started_at,
        })
    }
}

/// Runs one toolchain step in `cwd` with inherited stdio, mapping any
/// failure to its exit code (-1 when the command could not run at all).
async fn run_step(line: &str, cwd: &Path) -> Result<(), StepFailure> {
    let (cmd, args) = match split_command(line) {
        Ok(parts) => parts,
        Err(err) => {
            warn!(command = %line, %err, "unrunnable toolchain command");
            return Err(StepFailure { code: -1 });
        }
    };
    let status = Command::new(cmd)
        .args(args)
        .current_dir(cwd)
        .status()
        .await;
    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(StepFailure {
            code: status.code().unwrap_or(-1),
        }),
        Err(err) => {
            warn!(command = %line, %err, "failed to invoke toolchain command");
            Err(StepFailure { code: -1 })
        }
    }
}

fn split_command(line: &str) -> Result<(String, Vec<String>), LaunchError> {
    let mut parts = shell_words::split(line)
        .map_err(|err| LaunchError::InvalidCommand(format!("{}: {}", line, err)))?;
    if parts.is_empty() {
        return Err(LaunchError::InvalidCommand("empty command".to_string()));
    }
    let cmd = parts.remove(0);
    Ok((cmd, parts))
}

/// Filesystem-safe log file stem: every non-alphanumeric character becomes
/// a hyphen.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_name("Billing API"), "Billing-API");
        assert_eq!(sanitize_name("web/ui v2"), "web-ui-v2");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn split_command_handles_quotes() {
        let (cmd, args) = split_command("dotnet run --project \"My App\"").unwrap();
        assert_eq!(cmd, "dotnet");
        assert_eq!(args, vec!["run", "--project", "My App"]);
    }

    #[test]
    fn split_command_rejects_empty() {
        assert!(split_command("").is_err());
        assert!(split_command("   ").is_err());
    }

    fn test_launcher(dir: &Path, extension: &str) -> ServiceLauncher {
        ServiceLauncher {
            log_dir: dir.join("logs"),
            toolchain: Toolchain {
                project_extension: extension.to_string(),
                ..Toolchain::default()
            },
        }
    }

    #[test]
    fn project_file_checks() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = test_launcher(dir.path(), "csproj");

        let err = launcher.check_project_file(dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::ProjectFileMissing { .. }));

        std::fs::write(dir.path().join("app.csproj"), "<Project/>").unwrap();
        assert!(launcher.check_project_file(dir.path()).is_ok());

        std::fs::write(dir.path().join("other.csproj"), "<Project/>").unwrap();
        let err = launcher.check_project_file(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ProjectFileAmbiguous { count: 2, .. }
        ));
    }

    #[tokio::test]
    async fn launch_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = test_launcher(dir.path(), "csproj");
        let service = ServiceConfig {
            name: "ghost".to_string(),
            path: dir.path().join("does-not-exist"),
            color: None,
        };
        let err = launcher.launch(&service, false).await.unwrap_err();
        assert!(matches!(err, LaunchError::PathNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_reports_failed_build() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("svc");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("svc.csproj"), "<Project/>").unwrap();
        let launcher = ServiceLauncher {
            log_dir: dir.path().join("logs"),
            toolchain: Toolchain {
                restore: "true".to_string(),
                build: "false".to_string(),
                run: "sleep 30".to_string(),
                project_extension: "csproj".to_string(),
                ..Toolchain::default()
            },
        };
        let service = ServiceConfig {
            name: "svc".to_string(),
            path: project,
            color: None,
        };
        let err = launcher.launch(&service, false).await.unwrap_err();
        assert!(matches!(err, LaunchError::BuildFailed { code: 1 }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_spawns_detached_process() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("svc");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("svc.csproj"), "<Project/>").unwrap();
        let launcher = ServiceLauncher {
            log_dir: dir.path().join("logs"),
            toolchain: Toolchain {
                restore: "true".to_string(),
                build: "true".to_string(),
                run: "sleep 30".to_string(),
                project_extension: "csproj".to_string(),
                ..Toolchain::default()
            },
        };
        let service = ServiceConfig {
            name: "My Svc".to_string(),
            path: project.clone(),
            color: None,
        };
        let tracked = launcher.launch(&service, false).await.unwrap();
        assert_eq!(tracked.name, "My Svc");
        assert_eq!(tracked.working_directory, project.display().to_string());
        assert!(crate::probe::is_alive(tracked.pid));
        assert!(dir.path().join("logs/My-Svc.log").exists());
        assert!(dir.path().join("logs/My-Svc.log.err").exists());
        assert!(crate::probe::kill(tracked.pid));
    }
}
