//! Exclusive per-repository command lock.
//!
//! Serializes load→mutate→save across concurrent invocations; a second
//! command against the same repository fails fast instead of clobbering
//! the state file.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = ".branchbox.lock";

/// Lock guard that removes the lock file on drop.
#[derive(Debug)]
pub struct CommandLock {
    file: File,
    path: PathBuf,
}

impl Drop for CommandLock {
    fn drop(&mut self) {
        // Best-effort unlock; ignore errors
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}

/// Acquire a non-blocking exclusive lock at `<repo_root>/.branchbox.lock`.
pub fn acquire_lock(repo_root: &Path) -> io::Result<CommandLock> {
    acquire_lock_at(&repo_root.join(LOCK_FILE))
}

/// Acquire a lock at a specific path (helper for tests).
pub fn acquire_lock_at(p: &Path) -> io::Result<CommandLock> {
    if let Some(parent) = p.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(p)?;
    match f.try_lock_exclusive() {
        Ok(()) => Ok(CommandLock {
            file: f,
            path: p.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(io::Error::other(
            "another branchbox command is already running (lock held); try again later",
        )),
        Err(e) => Err(e),
    }
}
