// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-surface specs: validation, exit codes, config plumbing.
//! No worker processes involved.

use crate::prelude::*;

// ── Enqueue ─────────────────────────────────────────────────────────────────

#[test]
fn enqueue_then_list_and_status() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"hw","command":"echo hi"}"#);

    let job = temp.job("hw").expect("job listed");
    assert_eq!(job["state"], "pending");
    assert_eq!(job["attempts"], 0);
    assert_eq!(job["max_retries"], 3);

    let status = temp.status_json();
    assert_eq!(status["pending"], 1);
    assert_eq!(status["processing"], 0);
}

#[test]
fn enqueue_carries_metadata_through() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"m","command":"true","team":"infra","weight":2}"#);

    let job = temp.job("m").expect("job listed");
    assert_eq!(job["metadata"]["team"], "infra");
    assert_eq!(job["metadata"]["weight"], "2");
}

#[test]
fn enqueue_duplicate_id_exits_4() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"dup","command":"true"}"#);
    temp.queuectl()
        .args(&["enqueue", r#"{"id":"dup","command":"true"}"#])
        .fails_with(4);
}

#[test]
fn enqueue_validation_failures_exit_2() {
    let temp = Project::empty();
    temp.queuectl().args(&["enqueue", "{not json"]).fails_with(2);
    temp.queuectl()
        .args(&["enqueue", r#"{"id":"x"}"#])
        .fails_with(2);
    temp.queuectl()
        .args(&["enqueue", r#"{"id":"x","command":""}"#])
        .fails_with(2);
    temp.queuectl()
        .args(&["enqueue", r#"{"id":"x","command":"true","max_retries":0}"#])
        .fails_with(2);
}

// ── List ────────────────────────────────────────────────────────────────────

#[test]
fn list_filters_by_state() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"a","command":"true"}"#);

    let out = temp
        .queuectl()
        .args(&["list", "--state", "pending"])
        .passes()
        .stdout_string();
    assert!(out.contains("a"));

    let out = temp
        .queuectl()
        .args(&["list", "--state", "dlq"])
        .passes()
        .stdout_string();
    assert!(out.contains("No jobs found"));
}

#[test]
fn list_rejects_unknown_state() {
    let temp = Project::empty();
    temp.queuectl()
        .args(&["list", "--state", "done"])
        .fails_with(2);
}

// ── DLQ errors ──────────────────────────────────────────────────────────────

#[test]
fn dlq_retry_unknown_id_exits_3() {
    let temp = Project::empty();
    temp.queuectl()
        .args(&["dlq", "retry", "ghost"])
        .fails_with(3);
}

#[test]
fn dlq_retry_non_dlq_job_exits_5() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"p","command":"true"}"#);
    temp.queuectl().args(&["dlq", "retry", "p"]).fails_with(5);
}

#[test]
fn dlq_list_empty() {
    let temp = Project::empty();
    let out = temp.queuectl().args(&["dlq", "list"]).passes().stdout_string();
    assert!(out.contains("Dead letter queue is empty"));
}

// ── Config ──────────────────────────────────────────────────────────────────

#[test]
fn config_get_shows_defaults() {
    let temp = Project::empty();
    let out = temp
        .queuectl()
        .args(&["config", "get", "max_retries"])
        .passes()
        .stdout_string();
    assert_eq!(out.trim(), "3");

    let table = temp.queuectl().args(&["config", "get"]).passes().stdout_string();
    assert!(table.contains("backoff_base"));
    assert!(table.contains("queuectl.db"));
}

#[test]
fn config_set_get_reset_roundtrip() {
    let temp = Project::empty();
    temp.queuectl()
        .args(&["config", "set", "max_retries", "7"])
        .passes();

    let out = temp
        .queuectl()
        .args(&["config", "get", "max_retries"])
        .passes()
        .stdout_string();
    assert_eq!(out.trim(), "7");

    // New jobs pick up the override as their default budget.
    temp.enqueue(r#"{"id":"j","command":"true"}"#);
    assert_eq!(temp.job("j").unwrap()["max_retries"], 7);

    temp.queuectl()
        .args(&["config", "reset", "max_retries"])
        .passes();
    let out = temp
        .queuectl()
        .args(&["config", "get", "max_retries"])
        .passes()
        .stdout_string();
    assert_eq!(out.trim(), "3");
}

#[test]
fn config_rejects_bad_values_and_keys() {
    let temp = Project::empty();
    temp.queuectl()
        .args(&["config", "set", "max_retries", "zero"])
        .fails_with(2);
    temp.queuectl()
        .args(&["config", "set", "job_timeout", "0"])
        .fails_with(2);
    temp.queuectl()
        .args(&["config", "set", "no_such_key", "1"])
        .fails_with(2);
    temp.queuectl()
        .args(&["config", "get", "no_such_key"])
        .fails_with(2);
}

#[test]
fn config_db_path_moves_the_database() {
    let temp = Project::empty();
    temp.queuectl()
        .args(&["config", "set", "db_path", "state/other.db"])
        .passes();

    assert!(temp.root().join("queuectl.toml").exists());
    temp.enqueue(r#"{"id":"a","command":"true"}"#);
    assert!(temp.root().join("state/other.db").exists());

    // Reset points back at the default database, which has no jobs.
    temp.queuectl().args(&["config", "reset", "db_path"]).passes();
    assert!(temp.job("a").is_none());
}

// ── Worker plumbing (no processes) ──────────────────────────────────────────

#[test]
fn worker_stop_without_sidecar_is_fine() {
    let temp = Project::empty();
    let out = temp
        .queuectl()
        .args(&["worker", "stop"])
        .passes()
        .stdout_string();
    assert!(out.contains("No workers to stop"));
}

#[test]
fn worker_start_rejects_zero_count() {
    let temp = Project::empty();
    temp.queuectl()
        .args(&["worker", "start", "--count", "0"])
        .fails_with(2);
}
