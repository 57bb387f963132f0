// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool supervision: spawn detached `queuectld` processes, track
//! their PIDs in the `workers.pid` sidecar, and deliver stop signals.
//!
//! The sidecar only exists so `worker stop` can find processes started by an
//! earlier CLI invocation; the store's workers table stays authoritative.

use crate::exit_error::{codes, ExitError};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use queuectl_core::{home::HOME_ENV, Home};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How long `stop` waits for a graceful exit before escalating to SIGKILL.
const STOP_GRACE: Duration = Duration::from_secs(10);

/// What `stop` did to each PID it found in the sidecar.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StopSummary {
    pub stopped: Vec<u32>,
    pub killed: Vec<u32>,
    pub already_gone: Vec<u32>,
}

/// Spawn `count` detached worker processes and overwrite the sidecar with
/// their PIDs.
pub fn start(home: &Home, count: usize) -> Result<Vec<u32>, ExitError> {
    let binary = find_worker_binary();
    let root = canonical_root(home)?;

    let mut pids = Vec::with_capacity(count);
    for _ in 0..count {
        let child = Command::new(&binary)
            .env(HOME_ENV, &root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|e| {
                ExitError::new(
                    codes::GENERIC,
                    format!("failed to spawn {}: {e}", binary.display()),
                )
            })?;
        pids.push(child.id());
    }

    write_pid_file(&home.pid_file(), &pids)?;
    Ok(pids)
}

/// Run a single worker in the calling terminal, logging to stderr.
pub fn run_foreground(home: &Home) -> Result<(), ExitError> {
    let binary = find_worker_binary();
    let root = canonical_root(home)?;
    let status = Command::new(&binary)
        .arg("--foreground")
        .env(HOME_ENV, &root)
        .status()
        .map_err(|e| {
            ExitError::new(
                codes::GENERIC,
                format!("failed to run {}: {e}", binary.display()),
            )
        })?;
    if !status.success() {
        return Err(ExitError::new(
            status.code().unwrap_or(codes::GENERIC),
            "worker exited with failure".to_string(),
        ));
    }
    Ok(())
}

/// SIGTERM every sidecar PID, wait a bounded grace period, SIGKILL
/// stragglers, delete the sidecar.
pub fn stop(home: &Home) -> Result<StopSummary, ExitError> {
    let path = home.pid_file();
    if !path.exists() {
        return Ok(StopSummary::default());
    }

    let pids = read_pid_file(&path)?;
    let mut summary = StopSummary::default();
    let mut waiting = Vec::new();

    for pid in pids {
        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => waiting.push(pid),
            Err(nix::errno::Errno::ESRCH) => summary.already_gone.push(pid),
            Err(e) => {
                return Err(ExitError::new(
                    codes::GENERIC,
                    format!("failed to signal pid {pid}: {e}"),
                ))
            }
        }
    }

    let deadline = Instant::now() + STOP_GRACE;
    while !waiting.is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(200));
        waiting.retain(|&pid| {
            if is_alive(pid) {
                true
            } else {
                summary.stopped.push(pid);
                false
            }
        });
    }

    for pid in waiting {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
        summary.killed.push(pid);
    }

    std::fs::remove_file(&path)?;
    Ok(summary)
}

fn is_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Locate the worker binary: sibling of the current executable, else `PATH`.
fn find_worker_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("queuectld");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("queuectld")
}

/// The data directory as an absolute path, so spawned workers agree on it
/// regardless of their own working directory.
fn canonical_root(home: &Home) -> Result<PathBuf, ExitError> {
    std::fs::canonicalize(home.root()).map_err(|e| {
        ExitError::new(
            codes::GENERIC,
            format!("data directory {} not accessible: {e}", home.root().display()),
        )
    })
}

fn write_pid_file(path: &Path, pids: &[u32]) -> Result<(), ExitError> {
    let mut body = String::new();
    for pid in pids {
        body.push_str(&format!("{pid}\n"));
    }
    std::fs::write(path, body)?;
    Ok(())
}

/// Parse the sidecar, skipping blank or junk lines (it is advisory).
pub fn read_pid_file(path: &Path) -> Result<Vec<u32>, ExitError> {
    let body = std::fs::read_to_string(path)?;
    Ok(body
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect())
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
