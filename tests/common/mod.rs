//! Shared test doubles: recording collaborators with failure injection.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use branchbox::errors::LifecycleError;
use branchbox::{ContainerTool, StateStore, WorktreeTool};

/// In-memory worktree collaborator. Records every call; `fail_*` flags make
/// the corresponding operation report its step error.
#[derive(Debug, Default)]
pub struct FakeWorktree {
    pub calls: RefCell<Vec<String>>,
    pub fail_create: bool,
    pub fail_remove: bool,
}

impl WorktreeTool for FakeWorktree {
    fn create(&self, branch: &str) -> Result<(), LifecycleError> {
        self.calls.borrow_mut().push(format!("create {branch}"));
        if self.fail_create {
            return Err(LifecycleError::WorktreeCreateFailed {
                branch: branch.to_string(),
                reason: "injected create failure".to_string(),
            });
        }
        Ok(())
    }

    fn remove(&self, branch: &str) -> Result<(), LifecycleError> {
        self.calls.borrow_mut().push(format!("remove {branch}"));
        if self.fail_remove {
            return Err(LifecycleError::WorktreeRemoveFailed {
                branch: branch.to_string(),
                reason: "injected remove failure".to_string(),
            });
        }
        Ok(())
    }

    fn path_for(&self, branch: &str) -> PathBuf {
        PathBuf::from("/fake/worktrees").join(branch)
    }
}

/// In-memory container collaborator, same recording scheme.
#[derive(Debug, Default)]
pub struct FakeContainer {
    pub calls: RefCell<Vec<String>>,
    pub fail_config: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
}

impl ContainerTool for FakeContainer {
    fn generate_config(&self, branch: &str, port: u16) -> Result<(), LifecycleError> {
        self.calls.borrow_mut().push(format!("config {branch} {port}"));
        if self.fail_config {
            return Err(LifecycleError::ConfigWriteFailed {
                branch: branch.to_string(),
                reason: "injected config failure".to_string(),
            });
        }
        Ok(())
    }

    fn start(&self, branch: &str) -> Result<(), LifecycleError> {
        self.calls.borrow_mut().push(format!("start {branch}"));
        if self.fail_start {
            return Err(LifecycleError::ContainerStartFailed {
                branch: branch.to_string(),
                reason: "injected start failure".to_string(),
            });
        }
        Ok(())
    }

    fn stop(&self, branch: &str) -> Result<(), LifecycleError> {
        self.calls.borrow_mut().push(format!("stop {branch}"));
        if self.fail_stop {
            return Err(LifecycleError::ContainerStopFailed {
                branch: branch.to_string(),
                reason: "injected stop failure".to_string(),
            });
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn store_in(dir: &Path) -> StateStore {
    StateStore::at(dir.join("state.json"))
}

#[allow(dead_code)]
pub fn stop_calls(container: &FakeContainer) -> Vec<String> {
    container
        .calls
        .borrow()
        .iter()
        .filter(|c| c.starts_with("stop "))
        .cloned()
        .collect()
}
