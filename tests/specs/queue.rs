// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end queue semantics with real worker processes.

use crate::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn job_completes_within_seconds() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"hw","command":"echo hi"}"#);
    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();

    let completed = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.job_state("hw").as_deref() == Some("completed")
    });
    assert!(completed, "job should complete; jobs: {:?}", temp.jobs_json());

    let job = temp.job("hw").unwrap();
    assert_eq!(job["attempts"], 1);
    assert!(job["worker_id"].is_null());
    assert_eq!(temp.status_json()["dlq"], 0);

    temp.queuectl().args(&["worker", "stop"]).passes();
}

#[test]
#[serial]
fn failing_job_backs_off_then_dead_letters() {
    let temp = Project::empty();
    let enqueued_at = std::time::Instant::now();
    temp.enqueue(r#"{"id":"f","command":"exit 1","max_retries":2}"#);
    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();

    let dead = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.job_state("f").as_deref() == Some("dlq")
    });
    assert!(dead, "job should dead-letter; jobs: {:?}", temp.jobs_json());

    // Attempt 1 fails immediately; attempt 2 only becomes eligible after the
    // 2 s backoff (base 2, exponent 1), so reaching the DLQ takes >= 2 s.
    assert!(
        enqueued_at.elapsed() >= std::time::Duration::from_secs(2),
        "second attempt ran before the backoff expired"
    );

    let job = temp.job("f").unwrap();
    assert_eq!(job["attempts"], 2);
    assert!(job["error_message"].as_str().is_some_and(|e| !e.is_empty()));

    // DLQ is terminal until an operator acts.
    let out = temp.queuectl().args(&["dlq", "list"]).passes().stdout_string();
    assert!(out.contains("f"));

    temp.queuectl().args(&["worker", "stop"]).passes();
}

#[test]
#[serial]
fn pool_processes_every_job_exactly_once() {
    let temp = Project::empty();
    for i in 0..5 {
        temp.enqueue(&format!(r#"{{"id":"job-{i}","command":"sleep 1"}}"#));
    }
    temp.queuectl().args(&["worker", "start", "--count", "3"]).passes();
    assert_eq!(temp.worker_pids().len(), 3);

    let all_done = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.jobs_json()
            .iter()
            .all(|j| j["state"] == "completed")
    });
    assert!(all_done, "all jobs should complete; jobs: {:?}", temp.jobs_json());

    for job in temp.jobs_json() {
        assert_eq!(job["attempts"], 1, "job {} double-processed", job["id"]);
    }

    temp.queuectl().args(&["worker", "stop"]).passes();
}

#[test]
#[serial]
fn unknown_command_dead_letters_with_an_error() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"bad","command":"nonexistent_command_xyz","max_retries":1}"#);
    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();

    let dead = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.job_state("bad").as_deref() == Some("dlq")
    });
    assert!(dead, "job should dead-letter; jobs: {:?}", temp.jobs_json());

    let job = temp.job("bad").unwrap();
    assert_eq!(job["attempts"], 1);
    assert!(job["error_message"].as_str().is_some_and(|e| !e.is_empty()));

    temp.queuectl().args(&["worker", "stop"]).passes();
}

#[test]
#[serial]
fn dlq_retry_makes_the_job_claimable_again() {
    let temp = Project::empty();
    temp.enqueue(r#"{"id":"f","command":"exit 1","max_retries":1}"#);
    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.job_state("f").as_deref() == Some("dlq")
    }));
    temp.queuectl().args(&["worker", "stop"]).passes();

    temp.queuectl().args(&["dlq", "retry", "f"]).passes();
    let job = temp.job("f").unwrap();
    assert_eq!(job["state"], "pending");
    assert_eq!(job["attempts"], 0);
    assert!(job["error_message"].is_null());

    // Claimable immediately: a fresh worker picks it straight up.
    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.job_state("f").as_deref() == Some("dlq")
    }));
    assert_eq!(temp.job("f").unwrap()["attempts"], 1);

    temp.queuectl().args(&["worker", "stop"]).passes();
}

#[test]
#[serial]
fn graceful_stop_deregisters_workers() {
    let temp = Project::empty();
    temp.queuectl().args(&["worker", "start", "--count", "2"]).passes();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.status_json()["active_workers"] == 2
    }));

    let out = temp.queuectl().args(&["worker", "stop"]).passes().stdout_string();
    assert!(out.contains("Stopped worker"));
    assert!(!temp.root().join("workers.pid").exists());

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        let status = temp.status_json();
        status["active_workers"] == 0 && status["stopped_workers"] == 2
    }));
}
