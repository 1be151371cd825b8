//! Operation orchestration.
//!
//! The controller combines the registry, the persisted process table, the
//! probe, and the launcher into the user-facing operations. Every
//! operation loads the table once at entry and persists it exactly once at
//! exit; per-service outcomes print inline as they happen and one
//! service's failure never aborts its siblings.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::launcher::ServiceLauncher;
use crate::output::{format_duration, format_memory, paint};
use crate::probe::{self, ProcessUsage};
use crate::prompt::SelectionPrompt;
use crate::table::ProcessTable;

/// Pause between consecutive launches. Throttling only: it spaces out
/// build resource usage, it is not a synchronization point.
const LAUNCH_DELAY: Duration = Duration::from_millis(500);
/// Pause between the stop and start halves of a restart.
const RESTART_DELAY: Duration = Duration::from_secs(2);

/// How an operation ended. Per-service failures still count as
/// `Completed`; `Cancelled` means the user backed out before any state
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Completed,
    Cancelled,
}

/// One line of the status report.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub name: String,
    pub pid: u32,
    pub alive: bool,
    pub usage: Option<ProcessUsage>,
}

pub struct ServiceController<'a> {
    config: &'a Config,
    launcher: ServiceLauncher,
    prompt: &'a dyn SelectionPrompt,
}

impl<'a> ServiceController<'a> {
    pub fn new(config: &'a Config, prompt: &'a dyn SelectionPrompt) -> Self {
        Self {
            config,
            launcher: ServiceLauncher::new(config),
            prompt,
        }
    }

    /// Launches every configured service and replaces the persisted table
    /// with the successes, discarding whatever was tracked before. If the
    /// old table still lists services, the user confirms the discard
    /// first.
    pub async fn start_all(&self, update: bool) -> Result<OpOutcome> {
        let previous = ProcessTable::load(&self.config.pid_file)?;
        if !previous.is_empty() {
            println!(
                "{} tracked service(s) may still be running.",
                previous.len()
            );
            if !self
                .prompt
                .confirm("Discard the current process table and start fresh?")?
            {
                println!("Cancelled.");
                return Ok(OpOutcome::Cancelled);
            }
        }

        let mut table = ProcessTable::default();
        let total = self.config.services.len();
        for (idx, service) in self.config.services.iter().enumerate() {
            let name = paint(&service.name, service.color.as_deref());
            println!("Starting {}", name);
            match self.launcher.launch(service, update).await {
                Ok(tracked) => {
                    println!("  + {} started (pid {})", name, tracked.pid);
                    table.push(tracked);
                }
                Err(err) => println!("  x {}: {}", name, err),
            }
            if idx + 1 < total {
                tokio::time::sleep(LAUNCH_DELAY).await;
            }
        }

        let started = table.len();
        table.save(&self.config.pid_file)?;
        println!("{} of {} service(s) started.", started, total);
        Ok(OpOutcome::Completed)
    }

    /// Prompts for a subset of services and relaunches only those. Tracked
    /// entries for unselected services are carried over untouched — this
    /// is a merge, unlike [`start_all`](Self::start_all)'s replace.
    pub async fn start_selected(&self, update: bool) -> Result<OpOutcome> {
        let previous = ProcessTable::load(&self.config.pid_file)?;
        let labels: Vec<String> = self
            .config
            .services
            .iter()
            .map(|service| service.name.clone())
            .collect();
        let Some(selection) = self.prompt.select("Services to start", &labels)? else {
            println!("Cancelled.");
            return Ok(OpOutcome::Cancelled);
        };
        if selection.is_empty() {
            println!("Nothing selected.");
            return Ok(OpOutcome::Completed);
        }

        let mut selected_names = HashSet::new();
        let mut launched = Vec::new();
        let total = selection.len();
        for (pos, &idx) in selection.iter().enumerate() {
            let Some(service) = self.config.services.get(idx) else {
                continue;
            };
            selected_names.insert(service.name.clone());
            let name = paint(&service.name, service.color.as_deref());

            // A tracked instance that is still alive is stopped before the
            // relaunch. First match by name; failure to stop skips the
            // launch but never the rest of the batch.
            if let Some(existing) = previous.find_by_name(&service.name) {
                if probe::matches_tracked(existing) {
                    if probe::kill(existing.pid) {
                        println!("  + {} stopped (pid {})", name, existing.pid);
                    } else {
                        warn!(
                            service = %service.name,
                            pid = existing.pid,
                            "failed to stop running instance"
                        );
                        println!(
                            "  x {}: failed to stop pid {}, skipping launch",
                            name, existing.pid
                        );
                        continue;
                    }
                }
            }

            println!("Starting {}", name);
            match self.launcher.launch(service, update).await {
                Ok(tracked) => {
                    println!("  + {} started (pid {})", name, tracked.pid);
                    launched.push(tracked);
                }
                Err(err) => println!("  x {}: {}", name, err),
            }
            if pos + 1 < total {
                tokio::time::sleep(LAUNCH_DELAY).await;
            }
        }

        let started = launched.len();
        let mut result = previous.without_names(&selected_names);
        for tracked in launched {
            result.push(tracked);
        }
        result.save(&self.config.pid_file)?;
        println!("{} of {} selected service(s) started.", started, total);
        Ok(OpOutcome::Completed)
    }

    /// Terminates every tracked process and deletes the table, regardless
    /// of per-entry outcomes.
    pub fn stop_all(&self) -> Result<OpOutcome> {
        let path = &self.config.pid_file;
        if !ProcessTable::exists(path) {
            println!("No tracked services.");
            return Ok(OpOutcome::Completed);
        }
        let table = ProcessTable::load(path)?;
        let total = table.len();
        let mut stopped = 0;
        for entry in table.entries() {
            let name = self.painted(&entry.name);
            if probe::matches_tracked(entry) {
                if probe::kill(entry.pid) {
                    stopped += 1;
                    println!("  + {} stopped (pid {})", name, entry.pid);
                } else {
                    println!("  x {}: failed to stop pid {}", name, entry.pid);
                }
            } else {
                println!("  o {} not running (stale pid {})", name, entry.pid);
            }
        }
        ProcessTable::default().save(path)?;
        println!("{} of {} tracked service(s) stopped.", stopped, total);
        Ok(OpOutcome::Completed)
    }

    /// Prompts for a subset of tracked entries, terminates them
    /// unconditionally (alive or not), and persists the remainder.
    pub fn stop_selected(&self) -> Result<OpOutcome> {
        let path = &self.config.pid_file;
        if !ProcessTable::exists(path) {
            println!("No tracked services.");
            return Ok(OpOutcome::Completed);
        }
        let table = ProcessTable::load(path)?;
        if table.is_empty() {
            // A foreign writer left an empty file; restore the
            // absent-file equivalence.
            ProcessTable::default().save(path)?;
            println!("No tracked services.");
            return Ok(OpOutcome::Completed);
        }

        let labels: Vec<String> = table
            .entries()
            .iter()
            .map(|entry| format!("{} (pid {})", entry.name, entry.pid))
            .collect();
        let Some(selection) = self.prompt.select("Services to stop", &labels)? else {
            println!("Cancelled.");
            return Ok(OpOutcome::Cancelled);
        };
        if selection.is_empty() {
            println!("Nothing selected.");
            return Ok(OpOutcome::Completed);
        }

        for &idx in &selection {
            let Some(entry) = table.entries().get(idx) else {
                continue;
            };
            let name = self.painted(&entry.name);
            if probe::kill(entry.pid) {
                println!("  + {} stopped (pid {})", name, entry.pid);
            } else {
                println!("  o {} was not running (pid {})", name, entry.pid);
            }
        }

        let remaining = table.without_indices(&selection);
        debug!(
            removed = selection.len(),
            remaining = remaining.len(),
            "pruned selected entries"
        );
        remaining.save(path)?;
        println!(
            "{} of {} tracked service(s) stopped, {} still tracked.",
            selection.len(),
            table.len(),
            remaining.len()
        );
        Ok(OpOutcome::Completed)
    }

    /// Reports liveness and resource usage for every tracked entry.
    /// Read-only: dead entries are surfaced, never pruned.
    pub fn status(&self) -> Result<Vec<StatusRow>> {
        let path = &self.config.pid_file;
        if !ProcessTable::exists(path) {
            println!("No tracked services.");
            return Ok(Vec::new());
        }
        let table = ProcessTable::load(path)?;
        println!("Service Status");
        println!("{:-<66}", "");
        let mut rows = Vec::with_capacity(table.len());
        for entry in table.entries() {
            let usage = if probe::matches_tracked(entry) {
                probe::usage(entry.pid)
            } else {
                None
            };
            // The process can exit between the liveness check and the
            // usage sample; no usage is reported as dead either way.
            let alive = usage.is_some();
            let padded = self.painted(&format!("{:<24}", entry.name));
            match &usage {
                Some(usage) => println!(
                    "  + {} pid {:<8} cpu {:>5.1}%  mem {:>9}  up {}",
                    padded,
                    entry.pid,
                    usage.cpu_percent,
                    format_memory(usage.memory_bytes),
                    format_duration(usage.run_time_secs)
                ),
                None => println!(
                    "  x {} pid {:<8} not running (stale entry)",
                    padded, entry.pid
                ),
            }
            rows.push(StatusRow {
                name: entry.name.clone(),
                pid: entry.pid,
                alive,
                usage,
            });
        }
        let running = rows.iter().filter(|row| row.alive).count();
        println!("{} of {} tracked service(s) running.", running, rows.len());
        Ok(rows)
    }

    /// stop-all, a settling delay, then start-all. The start half's
    /// discard confirmation never fires because the stop half just
    /// deleted the table.
    pub async fn restart_all(&self, update: bool) -> Result<OpOutcome> {
        self.stop_all()?;
        tokio::time::sleep(RESTART_DELAY).await;
        self.start_all(update).await
    }

    /// Colors a tracked name with its config entry's color, when the
    /// service is still configured.
    fn painted(&self, name: &str) -> String {
        let color = self
            .config
            .services
            .iter()
            .find(|service| name.trim_end() == service.name)
            .and_then(|service| service.color.as_deref());
        paint(name, color)
    }
}
