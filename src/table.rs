//! The persisted process table.
//!
//! This module defines the `TrackedProcess` record and the `ProcessTable`
//! that is serialized whole to a single JSON file. The table is the only
//! state shared between invocations; an entry never implies the process is
//! still alive, so every reader re-checks liveness through the probe.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A persisted record linking a service name to the OS process last known
/// to be running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProcess {
    /// Service name, copied from the config at launch time.
    pub name: String,
    /// OS process identifier captured at spawn; immutable once recorded.
    pub pid: u32,
    /// Working directory the service was launched from. Diagnostic only.
    pub working_directory: String,
    /// OS-reported process start time (seconds since epoch), when the
    /// probe could determine it at launch. Used to detect pid reuse;
    /// absence means the pid is trusted as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
}

/// An ordered sequence of tracked processes with whole-file persistence.
///
/// `save` of an empty table deletes the backing file, so "file absent" and
/// "no tracked services" are the same state. Every writer preserves that
/// equivalence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTable {
    entries: Vec<TrackedProcess>,
}

impl ProcessTable {
    pub fn new(entries: Vec<TrackedProcess>) -> Self {
        Self { entries }
    }

    /// Loads the table from `path`. An absent file is an empty table; a
    /// file that exists but does not parse is `DataCorruption`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(Error::Io(err)),
        };
        let entries: Vec<TrackedProcess> =
            serde_json::from_str(&raw).map_err(|source| Error::DataCorruption {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { entries })
    }

    /// Persists the table to `path` as a full overwrite, writing a sibling
    /// temp file and renaming it over the target. An empty table removes
    /// the file instead.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.entries.is_empty() {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::Io(err)),
            }
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn entries(&self) -> &[TrackedProcess] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, entry: TrackedProcess) {
        self.entries.push(entry);
    }

    /// First entry with the given name. Names are not enforced unique in
    /// tables written elsewhere, so this is a first-match policy.
    pub fn find_by_name(&self, name: &str) -> Option<&TrackedProcess> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// The table minus every entry whose name appears in `names`.
    pub fn without_names(&self, names: &HashSet<String>) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|entry| !names.contains(&entry.name))
                .cloned()
                .collect(),
        }
    }

    /// The table minus the entries at the given indices. Out-of-range
    /// indices are ignored.
    pub fn without_indices(&self, indices: &[usize]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .enumerate()
                .filter(|(idx, _)| !indices.contains(idx))
                .map(|(_, entry)| entry.clone())
                .collect(),
        }
    }
}
