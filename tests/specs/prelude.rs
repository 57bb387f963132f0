// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the end-to-end specs.

#![allow(dead_code)]

use std::path::Path;
use std::process::Output;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Generous ceiling for polling loops; individual specs finish far sooner.
pub const SPEC_WAIT_MAX_MS: u64 = 30_000;

/// One isolated queuectl home per spec.
pub struct Project {
    home: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temp home"),
        }
    }

    pub fn root(&self) -> &Path {
        self.home.path()
    }

    pub fn queuectl(&self) -> SpecCmd {
        let mut cmd = assert_cmd::Command::cargo_bin("queuectl").expect("queuectl binary");
        cmd.env("QUEUECTL_HOME", self.root());
        cmd.env("NO_COLOR", "1");
        SpecCmd { cmd }
    }

    pub fn enqueue(&self, payload: &str) {
        self.queuectl().args(&["enqueue", payload]).passes();
    }

    pub fn jobs_json(&self) -> Vec<serde_json::Value> {
        let out = self
            .queuectl()
            .args(&["list", "--output", "json"])
            .passes()
            .stdout_string();
        serde_json::from_str(&out).expect("list --output json")
    }

    pub fn job(&self, id: &str) -> Option<serde_json::Value> {
        self.jobs_json().into_iter().find(|j| j["id"] == id)
    }

    pub fn job_state(&self, id: &str) -> Option<String> {
        self.job(id)
            .and_then(|j| j["state"].as_str().map(str::to_string))
    }

    pub fn status_json(&self) -> serde_json::Value {
        let out = self
            .queuectl()
            .args(&["status", "--output", "json"])
            .passes()
            .stdout_string();
        serde_json::from_str(&out).expect("status --output json")
    }

    /// PIDs recorded by the last `worker start`.
    pub fn worker_pids(&self) -> Vec<u32> {
        let path = self.root().join("workers.pid");
        let body = std::fs::read_to_string(path).expect("workers.pid");
        body.lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect()
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        // Best effort: never leave workers behind if a spec fails mid-way.
        if self.root().join("workers.pid").exists() {
            if let Ok(mut cmd) = assert_cmd::Command::cargo_bin("queuectl") {
                cmd.env("QUEUECTL_HOME", self.root());
                let _ = cmd.args(["worker", "stop"]).output();
            }
        }
    }
}

pub struct SpecCmd {
    cmd: assert_cmd::Command,
}

impl SpecCmd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> SpecOutput {
        let output = self.cmd.output().expect("run command");
        assert!(
            output.status.success(),
            "command failed (status {:?})\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        SpecOutput(output)
    }

    pub fn fails_with(mut self, code: i32) -> SpecOutput {
        let output = self.cmd.output().expect("run command");
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        SpecOutput(output)
    }
}

pub struct SpecOutput(Output);

impl SpecOutput {
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.0.stdout).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.0.stderr).into_owned()
    }
}

/// Poll `f` until it returns true or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut f: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if f() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}
