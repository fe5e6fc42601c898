//! Environment diagnostics.

use std::path::Path;
use std::process::Command;

use which::which;

use crate::state::StateStore;

/// Print diagnostics for the host, the external tools, and the state file.
pub fn run_doctor(repo_root: Option<&Path>) {
    eprintln!("branchbox doctor");
    eprintln!("  version: v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "  build: {} ({}, {})",
        env!("BRANCHBOX_BUILD_DATE"),
        env!("BRANCHBOX_BUILD_TARGET"),
        env!("BRANCHBOX_BUILD_PROFILE")
    );
    eprintln!("  rustc: {}", env!("BRANCHBOX_BUILD_RUSTC"));
    eprintln!("  host: {} / {}", std::env::consts::OS, std::env::consts::ARCH);

    for tool in ["git", "devcontainer", "docker"] {
        probe_tool(tool);
    }

    match repo_root {
        Some(root) => {
            eprintln!("  repo: {}", root.display());
            report_state(root);
        }
        None => eprintln!("  repo: not inside a git repository"),
    }

    eprintln!("doctor: completed diagnostics.");
}

fn probe_tool(tool: &str) {
    match which(tool) {
        Ok(p) => {
            eprintln!("  {tool}: {}", p.display());
            if let Ok(out) = Command::new(&p).arg("--version").output() {
                let s = String::from_utf8_lossy(&out.stdout);
                if let Some(line) = s.lines().next() {
                    if !line.trim().is_empty() {
                        eprintln!("  {tool} --version: {}", line.trim());
                    }
                }
            }
        }
        Err(e) => eprintln!("  {tool}: not found ({e})"),
    }
}

fn report_state(root: &Path) {
    let store = StateStore::new(root);
    match store.load() {
        Ok(state) => {
            eprintln!(
                "  state: {} ({} environment(s), active: {})",
                store.path().display(),
                state.port_assignments.len(),
                state.active_branch.as_deref().unwrap_or("none")
            );
        }
        Err(e) => eprintln!("  state: {e}"),
    }
}
