use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use branchbox::errors::{exit_code_for_io_error, exit_code_for_lifecycle_error};
use branchbox::{
    doctor, lock, ports, worktree, ContainerTool, DevcontainerTool, ExecService, GitWorktree,
    LifecycleError, Orchestrator, StateStore, WorktreeTool,
};

mod cli;
use cli::{Cli, Cmd};

fn main() -> ExitCode {
    let cli = Cli::parse();
    // .env knobs are optional; a missing file is fine
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose);

    // Doctor needs neither a repository nor the lock
    if let Cmd::Doctor = cli.command {
        doctor::run_doctor(worktree::repo_root().as_deref());
        return ExitCode::SUCCESS;
    }

    let Some(root) = worktree::repo_root() else {
        eprintln!("branchbox: not inside a git repository");
        return ExitCode::from(1);
    };
    let store = StateStore::new(&root);

    // Read-only listing doesn't take the lock either
    if let Cmd::List { json } = cli.command {
        return match run_list(&store, json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("branchbox: {e:#}");
                ExitCode::from(1)
            }
        };
    }

    // Lifecycle commands serialize on the repository lock
    let lock = match lock::acquire_lock(&root) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("branchbox: {e}");
            return ExitCode::from(exit_code_for_io_error(&e));
        }
    };

    let exec = ExecService::from_env();
    let orchestrator = Orchestrator::new(
        store,
        ports::range_from_env(),
        GitWorktree::new(root.clone(), exec.clone()),
        DevcontainerTool::new(root, exec),
    );

    let result = run_lifecycle(&cli.command, &orchestrator);

    drop(lock);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("branchbox: {e}");
            ExitCode::from(exit_code_for_lifecycle_error(&e))
        }
    }
}

fn run_lifecycle<W, C>(cmd: &Cmd, orchestrator: &Orchestrator<W, C>) -> Result<(), LifecycleError>
where
    W: WorktreeTool,
    C: ContainerTool,
{
    match cmd {
        Cmd::Create { branch } => {
            let port = orchestrator.create(branch)?;
            println!("branchbox: created environment for '{branch}' on port {port}");
        }
        Cmd::Switch { branch } => {
            let path = orchestrator.switch(branch)?;
            println!("branchbox: switched to '{branch}'");
            if atty::is(atty::Stream::Stdout) {
                println!("branchbox: open in VS Code: code {}", path.display());
            } else {
                println!("{}", path.display());
            }
        }
        Cmd::Remove { branch } => {
            orchestrator.remove(branch)?;
            println!("branchbox: removed environment for '{branch}'");
        }
        Cmd::List { .. } | Cmd::Doctor => unreachable!("handled before lock acquisition"),
    }
    Ok(())
}

fn run_list(store: &StateStore, json: bool) -> anyhow::Result<()> {
    let state = store.load().context("failed to read environment state")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }
    if state.port_assignments.is_empty() {
        println!("branchbox: no environments");
        return Ok(());
    }
    for (branch, port) in &state.port_assignments {
        let marker = if state.active_branch.as_deref() == Some(branch.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {branch}  port {port}");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "branchbox=debug" } else { "branchbox=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
