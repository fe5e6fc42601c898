//! Lifecycle error taxonomy and process exit-code mapping.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the environment lifecycle operations.
///
/// Every variant carries the branch and/or failing step so a partial failure
/// can be diagnosed from the command line alone.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("an environment for branch '{0}' already exists")]
    AlreadyExists(String),

    #[error("no free port left in range {min}-{max}")]
    PoolExhausted { min: u16, max: u16 },

    #[error("failed to create worktree for branch '{branch}': {reason}")]
    WorktreeCreateFailed { branch: String, reason: String },

    #[error("failed to remove worktree for branch '{branch}': {reason}")]
    WorktreeRemoveFailed { branch: String, reason: String },

    #[error("failed to write devcontainer config for branch '{branch}': {reason}")]
    ConfigWriteFailed { branch: String, reason: String },

    #[error("failed to start container for branch '{branch}': {reason}")]
    ContainerStartFailed { branch: String, reason: String },

    /// Tolerated at every call site (stopping an already-stopped environment
    /// is a normal idempotent case); reported so callers can log it.
    #[error("failed to stop container for branch '{branch}': {reason}")]
    ContainerStopFailed { branch: String, reason: String },

    #[error("state file {} exists but cannot be parsed: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("{tool} timed out after {timeout:?} during {step}")]
    CollaboratorTimeout {
        tool: String,
        step: String,
        timeout: Duration,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (command not found)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

/// Convert LifecycleError to exit code (parity with io::Error mapping).
pub fn exit_code_for_lifecycle_error(e: &LifecycleError) -> u8 {
    match e {
        LifecycleError::Io(ioe) => exit_code_for_io_error(ioe),
        _ => 1,
    }
}
