// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: a hard-killed worker's claim is reverted and refunded.

use crate::prelude::*;
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn hard_killed_worker_loses_no_jobs() {
    let temp = Project::empty();
    // Tight heartbeat so the dead worker goes stale quickly (threshold 2x).
    temp.queuectl()
        .args(&["config", "set", "worker_heartbeat_interval", "1"])
        .passes();

    temp.enqueue(r#"{"id":"slow","command":"sleep 6"}"#);
    temp.enqueue(r#"{"id":"quick-1","command":"echo one"}"#);
    temp.enqueue(r#"{"id":"quick-2","command":"echo two"}"#);

    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();
    let pids = temp.worker_pids();
    assert_eq!(pids.len(), 1);

    // Wait for the worker to begin the slow job, then kill it ungracefully.
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.job_state("slow").as_deref() == Some("processing")
    }));
    std::process::Command::new("kill")
        .args(["-9", &pids[0].to_string()])
        .status()
        .expect("kill -9");

    // The orphaned claim survives until a new startup notices the stale
    // heartbeat; give the heartbeat time to cross the threshold.
    std::thread::sleep(Duration::from_secs(3));
    assert_eq!(temp.job_state("slow").as_deref(), Some("processing"));

    temp.queuectl().args(&["worker", "start", "--count", "1"]).passes();

    // Recovery reverts the orphan and the new worker drains everything.
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            temp.jobs_json().iter().all(|j| j["state"] == "completed")
        }),
        "all jobs should complete after recovery; jobs: {:?}",
        temp.jobs_json()
    );

    // The interrupted attempt was refunded: one counted execution, maybe two
    // if the kill raced the claim.
    let attempts = temp.job("slow").unwrap()["attempts"].as_u64().unwrap();
    assert!(attempts <= 2, "interrupted attempt not refunded: {attempts}");

    // The dead worker's registration was pruned to stopped.
    assert!(temp.status_json()["stopped_workers"].as_u64() >= Some(1));

    temp.queuectl().args(&["worker", "stop"]).passes();
}
