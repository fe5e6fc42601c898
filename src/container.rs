//! Devcontainer collaborator: config generation, container start/stop.
//!
//! Containers are addressed by the `branchbox.branch` label rather than by
//! name, so a stop targets whatever is actually running for the branch.

use std::fs;
use std::io;
use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing::debug;
use which::which;

use crate::errors::LifecycleError;
use crate::exec::{ExecError, ExecRequest, ExecService};
use crate::worktree::worktree_path;

pub const BRANCH_LABEL: &str = "branchbox.branch";

/// Container side of an environment. Start failures surface to the caller;
/// stop is tolerant of "nothing running" per the lifecycle contract.
pub trait ContainerTool {
    fn generate_config(&self, branch: &str, port: u16) -> Result<(), LifecycleError>;
    fn start(&self, branch: &str) -> Result<(), LifecycleError>;
    fn stop(&self, branch: &str) -> Result<(), LifecycleError>;
}

impl<T: ContainerTool + ?Sized> ContainerTool for &T {
    fn generate_config(&self, branch: &str, port: u16) -> Result<(), LifecycleError> {
        (**self).generate_config(branch, port)
    }
    fn start(&self, branch: &str) -> Result<(), LifecycleError> {
        (**self).start(branch)
    }
    fn stop(&self, branch: &str) -> Result<(), LifecycleError> {
        (**self).stop(branch)
    }
}

pub fn devcontainer_cli_path() -> io::Result<PathBuf> {
    static CACHE: OnceCell<Option<PathBuf>> = OnceCell::new();
    CACHE
        .get_or_init(|| which("devcontainer").ok())
        .clone()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "devcontainer CLI is required but was not found in PATH.",
            )
        })
}

pub fn docker_path() -> io::Result<PathBuf> {
    static CACHE: OnceCell<Option<PathBuf>> = OnceCell::new();
    CACHE.get_or_init(|| which("docker").ok()).clone().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Docker is required but was not found in PATH.",
        )
    })
}

/// Production collaborator driving the devcontainer CLI and docker.
#[derive(Debug, Clone)]
pub struct DevcontainerTool {
    repo_root: PathBuf,
    exec: ExecService,
}

impl DevcontainerTool {
    pub fn new(repo_root: PathBuf, exec: ExecService) -> Self {
        Self { repo_root, exec }
    }

    fn workspace(&self, branch: &str) -> PathBuf {
        worktree_path(&self.repo_root, branch)
    }
}

/// The generated config: devcontainer name, image build reference, the
/// forwarded port with its attributes, the branch-identity run label, and
/// the fixed in-container workspace folder.
pub fn devcontainer_config(branch: &str, port: u16) -> serde_json::Value {
    serde_json::json!({
        "name": format!("branchbox - {branch}"),
        "build": { "dockerfile": "../Dockerfile" },
        "forwardPorts": [port],
        "portsAttributes": {
            (port.to_string()): { "label": "web", "protocol": "http" }
        },
        "runArgs": [format!("--label={BRANCH_LABEL}={branch}")],
        "workspaceFolder": "/workspace",
    })
}

impl ContainerTool for DevcontainerTool {
    fn generate_config(&self, branch: &str, port: u16) -> Result<(), LifecycleError> {
        let dir = self.workspace(branch).join(".devcontainer");
        let write = || -> io::Result<()> {
            fs::create_dir_all(&dir)?;
            let mut rendered = serde_json::to_string_pretty(&devcontainer_config(branch, port))?;
            rendered.push('\n');
            fs::write(dir.join("devcontainer.json"), rendered)
        };
        write().map_err(|e| LifecycleError::ConfigWriteFailed {
            branch: branch.to_string(),
            reason: e.to_string(),
        })
    }

    fn start(&self, branch: &str) -> Result<(), LifecycleError> {
        let bin = devcontainer_cli_path().map_err(|e| start_failed(branch, e.to_string()))?;
        let workspace = self.workspace(branch);
        let out = self
            .exec
            .run(
                ExecRequest::new(bin)
                    .arg("up")
                    .arg("--workspace-folder")
                    .arg(workspace.to_string_lossy()),
            )
            .map_err(|e| map_exec_error(e, "devcontainer", "up", branch, start_failed))?;
        if !out.success() {
            return Err(start_failed(branch, out.error_line()));
        }
        Ok(())
    }

    fn stop(&self, branch: &str) -> Result<(), LifecycleError> {
        let docker = docker_path().map_err(|e| stop_failed(branch, e.to_string()))?;
        let filter = format!("label={BRANCH_LABEL}={branch}");
        let ps = self
            .exec
            .run(
                ExecRequest::new(&docker)
                    .args(["ps", "-q", "--filter"])
                    .arg(&filter),
            )
            .map_err(|e| map_exec_error(e, "docker", "ps", branch, stop_failed))?;
        if !ps.success() {
            return Err(stop_failed(branch, ps.error_line()));
        }

        let ids: Vec<&str> = ps.stdout.lines().filter(|l| !l.trim().is_empty()).collect();
        if ids.is_empty() {
            // No container for the branch: stopping an already-stopped
            // environment is a normal idempotent case.
            debug!("no running container labeled {filter}");
            return Ok(());
        }

        let out = self
            .exec
            .run(ExecRequest::new(&docker).arg("stop").args(ids))
            .map_err(|e| map_exec_error(e, "docker", "stop", branch, stop_failed))?;
        if !out.success() {
            return Err(stop_failed(branch, out.error_line()));
        }
        Ok(())
    }
}

fn start_failed(branch: &str, reason: String) -> LifecycleError {
    LifecycleError::ContainerStartFailed {
        branch: branch.to_string(),
        reason,
    }
}

fn stop_failed(branch: &str, reason: String) -> LifecycleError {
    LifecycleError::ContainerStopFailed {
        branch: branch.to_string(),
        reason,
    }
}

fn map_exec_error(
    e: ExecError,
    tool: &str,
    step: &str,
    branch: &str,
    to_step_error: fn(&str, String) -> LifecycleError,
) -> LifecycleError {
    match e {
        ExecError::Timeout { timeout, .. } => LifecycleError::CollaboratorTimeout {
            tool: tool.to_string(),
            step: step.to_string(),
            timeout,
        },
        other => to_step_error(branch, other.to_string()),
    }
}
