//! OS process probing.
//!
//! Liveness checks, resource usage, and forceful termination, all through
//! `sysinfo`. A nonexistent pid is a normal `false`/`None` result, never an
//! error. The probe cannot distinguish a pid the OS reassigned to an
//! unrelated process from the original; callers that recorded a start time
//! can narrow that window with [`matches_tracked`].

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::table::TrackedProcess;

/// How far a live process's start time may differ from the recorded one
/// before the pid is considered reused.
const START_TIME_TOLERANCE_SECS: u64 = 5;

/// Resource usage of a live process, for status display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessUsage {
    /// Instantaneous CPU usage in percent of one core.
    pub cpu_percent: f32,
    /// Resident memory in bytes.
    pub memory_bytes: u64,
    /// Seconds the process has been running.
    pub run_time_secs: u64,
}

fn refresh_one(system: &mut System, pid: u32, kind: ProcessRefreshKind) {
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
        true,
        kind,
    );
}

/// Whether a process with this identifier currently exists.
pub fn is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let mut system = System::new();
    refresh_one(&mut system, pid, ProcessRefreshKind::new());
    system.process(Pid::from_u32(pid)).is_some()
}

/// OS-reported start time of the process, in seconds since the epoch.
pub fn start_time(pid: u32) -> Option<u64> {
    if pid == 0 {
        return None;
    }
    let mut system = System::new();
    refresh_one(&mut system, pid, ProcessRefreshKind::new());
    system
        .process(Pid::from_u32(pid))
        .map(|process| process.start_time())
}

/// CPU, memory, and run time for a live process.
///
/// CPU usage needs two samples; the call blocks for sysinfo's minimum
/// sampling interval.
pub fn usage(pid: u32) -> Option<ProcessUsage> {
    if pid == 0 {
        return None;
    }
    let mut system = System::new();
    refresh_one(&mut system, pid, ProcessRefreshKind::everything());
    system.process(Pid::from_u32(pid))?;
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    refresh_one(&mut system, pid, ProcessRefreshKind::everything());
    system.process(Pid::from_u32(pid)).map(|process| ProcessUsage {
        cpu_percent: process.cpu_usage(),
        memory_bytes: process.memory(),
        run_time_secs: process.run_time(),
    })
}

/// Terminates the process forcefully (no graceful stage). Returns false if
/// the process does not exist or the kill could not be delivered.
pub fn kill(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let mut system = System::new();
    refresh_one(&mut system, pid, ProcessRefreshKind::new());
    match system.process(Pid::from_u32(pid)) {
        Some(process) => process.kill(),
        None => false,
    }
}

/// Whether the tracked entry still refers to a live process.
///
/// Alive, and — when both sides recorded a start time — started within
/// [`START_TIME_TOLERANCE_SECS`] of the recorded time. A start-time
/// mismatch means the OS reassigned the pid after the original exited.
pub fn matches_tracked(tracked: &TrackedProcess) -> bool {
    if !is_alive(tracked.pid) {
        return false;
    }
    match (tracked.started_at, start_time(tracked.pid)) {
        (Some(recorded), Some(current)) => {
            current.abs_diff(recorded) <= START_TIME_TOLERANCE_SECS
        }
        // Either side unknown: trust the pid.
        _ => true,
    }
}
