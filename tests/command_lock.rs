//! Exclusive command-lock behavior.

use std::io;

use branchbox::lock;

#[test]
fn test_acquire_lock_at_exclusive_and_release() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join(".branchbox.lock");

    // First lock should succeed
    let first = lock::acquire_lock_at(&p).expect("first acquire_lock_at failed");
    // Second lock on same path should fail
    let e = lock::acquire_lock_at(&p).expect_err("second acquire_lock_at unexpectedly succeeded");
    assert_eq!(e.kind(), io::ErrorKind::Other);
    assert!(
        e.to_string().contains("already running"),
        "unexpected error message: {e}"
    );
    drop(first);
    // After releasing, should succeed again
    let again = lock::acquire_lock_at(&p).expect("acquire_lock_at after release failed");
    drop(again);
    // The guard removes its lock file on drop
    assert!(!p.exists());
}

#[test]
fn test_acquire_lock_creates_missing_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("nested/dir/.branchbox.lock");
    let guard = lock::acquire_lock_at(&p).expect("lock in fresh directory");
    assert!(p.exists());
    drop(guard);
}

#[test]
fn test_repo_lock_path_is_at_root() {
    let tmp = tempfile::tempdir().unwrap();
    let guard = lock::acquire_lock(tmp.path()).expect("repo lock");
    assert!(tmp.path().join(lock::LOCK_FILE).exists());
    drop(guard);
}
