//! State store behavior: empty-on-absent, lossless round-trip, corrupt-file
//! surfacing, atomic replace.

use std::fs;

use branchbox::errors::LifecycleError;
use branchbox::{GlobalState, StateStore};

#[test]
fn test_load_missing_returns_empty_state() {
    let tmp = tempfile::tempdir().unwrap();
    let store = StateStore::at(tmp.path().join("state.json"));
    let state = store.load().expect("absent file is an empty state");
    assert_eq!(state, GlobalState::default());
}

#[test]
fn test_save_load_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let store = StateStore::at(tmp.path().join("state.json"));

    let mut state = GlobalState::default();
    state.active_branch = Some("alpha".to_string());
    state.port_assignments.insert("alpha".to_string(), 3000);
    state.port_assignments.insert("beta".to_string(), 3001);

    store.save(&state).expect("save");
    assert_eq!(store.load().expect("load"), state);
}

#[test]
fn test_save_after_load_is_stable_on_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    let store = StateStore::at(tmp.path().join("state.json"));

    let mut state = GlobalState::default();
    state.port_assignments.insert("alpha".to_string(), 3000);
    store.save(&state).unwrap();
    let first = fs::read(store.path()).unwrap();

    let reloaded = store.load().unwrap();
    store.save(&reloaded).unwrap();
    let second = fs::read(store.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_corrupt_state_is_surfaced_not_reset() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("state.json");
    fs::write(&path, "{ definitely not json").unwrap();

    let store = StateStore::at(&path);
    let err = store.load().expect_err("corrupt file must error");
    assert!(matches!(err, LifecycleError::CorruptState { .. }), "got: {err}");

    // The broken record is still on disk for inspection
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ definitely not json");
}

#[test]
fn test_save_creates_parent_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let store = StateStore::at(tmp.path().join(".branchbox/state.json"));
    store.save(&GlobalState::default()).expect("save creates dirs");
    assert!(store.path().is_file());
}

#[test]
fn test_save_leaves_no_temp_files_behind() {
    let tmp = tempfile::tempdir().unwrap();
    let store = StateStore::at(tmp.path().join("state.json"));
    store.save(&GlobalState::default()).unwrap();

    let entries: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, ["state.json"]);
}

#[test]
fn test_repo_scoped_store_path() {
    let tmp = tempfile::tempdir().unwrap();
    let store = StateStore::new(tmp.path());
    assert_eq!(
        store.path(),
        tmp.path().join(".branchbox").join("state.json")
    );
}
