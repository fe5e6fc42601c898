//! Command-line surface.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "branchbox",
    version,
    about = "Per-branch dev environments: git worktree + devcontainer on a dedicated port."
)]
pub(crate) struct Cli {
    /// Print detailed execution info
    #[arg(long, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Cmd {
    /// Create an isolated environment for a new branch
    Create {
        /// Branch name
        branch: String,
    },
    /// Make a branch the active environment (stops the previous one)
    Switch {
        /// Branch name
        branch: String,
    },
    /// Tear down a branch environment and free its port
    Remove {
        /// Branch name
        branch: String,
    },
    /// List known environments
    List {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Run diagnostics to check environment and configuration
    Doctor,
}
