// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn open_creates_schema_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queuectl.db");

    let store = Store::open(&path).unwrap();
    drop(store);

    // Re-open against the existing file: migrations must not error.
    let store = Store::open(&path).unwrap();
    assert!(store.list_workers().unwrap().is_empty());
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/state/queuectl.db");
    Store::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn wal_mode_is_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("queuectl.db")).unwrap();
    let mode = store
        .with_conn(|conn| {
            let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
            Ok(mode)
        })
        .unwrap();
    assert_eq!(mode, "wal");
}

#[test]
fn is_busy_only_matches_lock_contention() {
    assert!(!StoreError::NotFound("x".to_string()).is_busy());
    assert!(!StoreError::DuplicateId("x".to_string()).is_busy());
}
