//! branchbox: isolated per-branch development environments.
//!
//! Each branch gets a dedicated `git worktree` checkout, a devcontainer
//! configuration bound to a dedicated port from a bounded pool, and an
//! entry in a single persisted record of assignments and the active
//! branch. The orchestrator sequences create/switch/remove across those
//! resources and keeps the record consistent when a step fails part-way.

pub mod container;
pub mod doctor;
pub mod errors;
pub mod exec;
pub mod lock;
pub mod orchestrator;
pub mod ports;
pub mod state;
pub mod worktree;

pub use container::{devcontainer_config, ContainerTool, DevcontainerTool, BRANCH_LABEL};
pub use errors::{exit_code_for_io_error, exit_code_for_lifecycle_error, LifecycleError};
pub use exec::{ExecError, ExecOutput, ExecRequest, ExecService};
pub use lock::{acquire_lock, acquire_lock_at, CommandLock};
pub use orchestrator::Orchestrator;
pub use ports::PortAllocator;
pub use state::{GlobalState, StateStore};
pub use worktree::{repo_root, worktree_path, GitWorktree, WorktreeTool};
