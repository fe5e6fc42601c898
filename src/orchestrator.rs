//! Environment lifecycle orchestration across worktree, container, port
//! pool, and persisted state.
//!
//! Each operation loads the record, seeds a fresh port allocator from it,
//! drives the collaborators in a fixed order, and persists only after every
//! step has succeeded: a failure part-way leaves the durable record exactly
//! as loaded. Compensating actions for already-performed external steps are
//! best-effort; their own failures are logged and never mask the original
//! error.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::container::ContainerTool;
use crate::errors::LifecycleError;
use crate::ports::PortAllocator;
use crate::state::{GlobalState, StateStore};
use crate::worktree::WorktreeTool;

pub struct Orchestrator<W, C> {
    store: StateStore,
    port_min: u16,
    port_max: u16,
    worktrees: W,
    containers: C,
}

impl<W: WorktreeTool, C: ContainerTool> Orchestrator<W, C> {
    pub fn new(store: StateStore, (port_min, port_max): (u16, u16), worktrees: W, containers: C) -> Self {
        Self {
            store,
            port_min,
            port_max,
            worktrees,
            containers,
        }
    }

    /// The persisted assignments are the source of truth; the allocator is a
    /// derived index rebuilt from them on every operation.
    fn allocator_for(&self, state: &GlobalState) -> PortAllocator {
        PortAllocator::seeded(
            self.port_min,
            self.port_max,
            state.port_assignments.values().copied(),
        )
    }

    /// Provision a new environment: allocate a port, create the checkout,
    /// write the container config, then record the assignment. Returns the
    /// assigned port.
    pub fn create(&self, branch: &str) -> Result<u16, LifecycleError> {
        let mut state = self.store.load()?;
        if state.port_assignments.contains_key(branch) {
            return Err(LifecycleError::AlreadyExists(branch.to_string()));
        }

        let mut ports = self.allocator_for(&state);
        let port = ports.acquire()?;
        debug!("allocated port {port} for branch '{branch}'");

        if let Err(e) = self.worktrees.create(branch) {
            ports.release(port);
            return Err(e);
        }

        if let Err(e) = self.containers.generate_config(branch, port) {
            ports.release(port);
            // Don't leave an orphaned checkout behind; the original error
            // stands regardless of how the cleanup goes.
            if let Err(cleanup) = self.worktrees.remove(branch) {
                warn!("cleanup of worktree '{branch}' after failed config write also failed: {cleanup}");
            }
            return Err(e);
        }

        state.port_assignments.insert(branch.to_string(), port);
        self.store.save(&state)?;
        info!("created environment for '{branch}' on port {port}");
        Ok(port)
    }

    /// Activate a branch: stop the previously active container (tolerant),
    /// start the new one, then record the switch. Returns the worktree path
    /// of the now-active branch.
    pub fn switch(&self, branch: &str) -> Result<PathBuf, LifecycleError> {
        let mut state = self.store.load()?;

        if let Some(active) = state.active_branch.as_deref() {
            if active != branch {
                if let Err(e) = self.containers.stop(active) {
                    warn!("stopping previous environment '{active}' failed: {e}");
                }
            }
        }

        // A start that did not happen must not be recorded as a switch.
        self.containers.start(branch)?;

        state.active_branch = Some(branch.to_string());
        self.store.save(&state)?;
        info!("switched active environment to '{branch}'");
        Ok(self.worktrees.path_for(branch))
    }

    /// Tear down an environment: stop its container (tolerant), remove the
    /// checkout, then free the port and drop the assignment. A failed
    /// worktree removal keeps the assignment; the environment still exists.
    pub fn remove(&self, branch: &str) -> Result<(), LifecycleError> {
        let mut state = self.store.load()?;

        if let Err(e) = self.containers.stop(branch) {
            warn!("stopping environment '{branch}' during removal failed: {e}");
        }

        self.worktrees.remove(branch)?;

        let mut ports = self.allocator_for(&state);
        if let Some(port) = state.port_assignments.remove(branch) {
            ports.release(port);
            debug!("released port {port} for branch '{branch}'");
        }
        if state.active_branch.as_deref() == Some(branch) {
            state.active_branch = None;
        }

        self.store.save(&state)?;
        info!("removed environment for '{branch}'");
        Ok(())
    }
}
