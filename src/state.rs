//! Durable global state: the active branch and branch→port assignments.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::LifecycleError;

pub const STATE_DIR: &str = ".branchbox";
pub const STATE_FILE: &str = "state.json";

/// The single persisted record. Created empty on first run and rewritten
/// atomically after every successful lifecycle operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Branch whose container is currently expected to be running.
    pub active_branch: Option<String>,
    /// Branch → allocated port. BTreeMap keeps the serialized form stable.
    #[serde(default)]
    pub port_assignments: BTreeMap<String, u16>,
}

/// Durable read/write of [`GlobalState`] at `.branchbox/state.json`.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(repo_root: &Path) -> Self {
        Self {
            path: repo_root.join(STATE_DIR).join(STATE_FILE),
        }
    }

    /// Store backed by an explicit file path (helper for tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty state when no record exists yet. A record that exists but does
    /// not parse is surfaced, never silently discarded: resetting it would
    /// disconnect the record from the real worktrees and containers.
    pub fn load(&self) -> Result<GlobalState, LifecycleError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(GlobalState::default())
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| LifecycleError::CorruptState {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Atomic replace: write a sibling temp file, then rename it into place,
    /// so a concurrent or subsequent load never observes a partial record.
    pub fn save(&self, state: &GlobalState) -> Result<(), LifecycleError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(LifecycleError::Io)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(LifecycleError::Io)?;
        serde_json::to_writer_pretty(&mut tmp, state).map_err(io::Error::from)?;
        tmp.write_all(b"\n").map_err(LifecycleError::Io)?;
        tmp.persist(&self.path).map_err(|e| LifecycleError::Io(e.error))?;
        Ok(())
    }
}
