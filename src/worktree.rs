//! Git worktree collaborator: one checkout per branch under `worktrees/`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::LifecycleError;
use crate::exec::{ExecError, ExecRequest, ExecService};

pub const WORKTREES_DIR: &str = "worktrees";

/// Filesystem checkout location for a branch. Pure derivation from the
/// branch name; never fails.
pub fn worktree_path(repo_root: &Path, branch: &str) -> PathBuf {
    repo_root.join(WORKTREES_DIR).join(branch)
}

/// Repository root via `git rev-parse --show-toplevel`, or None when the
/// current directory is not inside a git repository.
pub fn repo_root() -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .stderr(std::process::Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

/// Creation and removal of per-branch checkouts. The orchestrator only
/// depends on this seam, so tests can drive it with recording fakes.
pub trait WorktreeTool {
    fn create(&self, branch: &str) -> Result<(), LifecycleError>;
    fn remove(&self, branch: &str) -> Result<(), LifecycleError>;
    /// Pure branch → checkout path derivation.
    fn path_for(&self, branch: &str) -> PathBuf;
}

impl<T: WorktreeTool + ?Sized> WorktreeTool for &T {
    fn create(&self, branch: &str) -> Result<(), LifecycleError> {
        (**self).create(branch)
    }
    fn remove(&self, branch: &str) -> Result<(), LifecycleError> {
        (**self).remove(branch)
    }
    fn path_for(&self, branch: &str) -> PathBuf {
        (**self).path_for(branch)
    }
}

/// Production collaborator shelling out to `git worktree`.
#[derive(Debug, Clone)]
pub struct GitWorktree {
    repo_root: PathBuf,
    exec: ExecService,
}

impl GitWorktree {
    pub fn new(repo_root: PathBuf, exec: ExecService) -> Self {
        Self { repo_root, exec }
    }

    fn git(&self, args: &[&str]) -> Result<crate::exec::ExecOutput, ExecError> {
        let root = self.repo_root.to_string_lossy();
        self.exec.run(
            ExecRequest::new("git")
                .args(["-C", root.as_ref()])
                .args(args.iter().copied()),
        )
    }
}

impl WorktreeTool for GitWorktree {
    fn create(&self, branch: &str) -> Result<(), LifecycleError> {
        let path = self.path_for(branch);
        let out = self
            .git(&[
                "worktree",
                "add",
                &path.to_string_lossy(),
                "--checkout",
                "-b",
                branch,
            ])
            .map_err(|e| map_exec_error(e, "worktree add", branch, create_failed))?;
        if !out.success() {
            return Err(create_failed(branch, out.error_line()));
        }
        Ok(())
    }

    fn remove(&self, branch: &str) -> Result<(), LifecycleError> {
        let path = self.path_for(branch);
        let out = self
            .git(&["worktree", "remove", &path.to_string_lossy(), "--force"])
            .map_err(|e| map_exec_error(e, "worktree remove", branch, remove_failed))?;
        if !out.success() {
            return Err(remove_failed(branch, out.error_line()));
        }
        Ok(())
    }

    fn path_for(&self, branch: &str) -> PathBuf {
        worktree_path(&self.repo_root, branch)
    }
}

fn create_failed(branch: &str, reason: String) -> LifecycleError {
    LifecycleError::WorktreeCreateFailed {
        branch: branch.to_string(),
        reason,
    }
}

fn remove_failed(branch: &str, reason: String) -> LifecycleError {
    LifecycleError::WorktreeRemoveFailed {
        branch: branch.to_string(),
        reason,
    }
}

/// Timeouts keep their own identity; spawn/wait failures become the step error.
fn map_exec_error(
    e: ExecError,
    step: &str,
    branch: &str,
    to_step_error: fn(&str, String) -> LifecycleError,
) -> LifecycleError {
    match e {
        ExecError::Timeout { timeout, .. } => LifecycleError::CollaboratorTimeout {
            tool: "git".to_string(),
            step: step.to_string(),
            timeout,
        },
        other => to_step_error(branch, other.to_string()),
    }
}
