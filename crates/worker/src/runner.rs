// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process launcher: `run(cmd, timeout)` with output capture.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Cap on captured stdout/stderr carried back to the worker loop.
const SNIPPET_LIMIT: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] std::io::Error),
}

/// Result of one command execution.
#[derive(Debug)]
pub struct Outcome {
    /// Child exit code; -1 when killed by timeout or signal.
    pub exit_code: i32,
    /// UTF-8-safe tail of captured stdout.
    pub stdout: String,
    /// UTF-8-safe tail of captured stderr.
    pub stderr: String,
    pub timed_out: bool,
    pub duration: Duration,
}

impl Outcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// Failure reason recorded on the job: timeout message, else the stderr
    /// tail, else the stdout tail, else the bare exit status.
    pub fn failure_reason(&self, timeout_secs: u64) -> String {
        if self.timed_out {
            return format!("timeout after {timeout_secs} seconds");
        }
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exit status {}", self.exit_code)
    }
}

/// Execute `command` through `sh -c` with a hard timeout.
///
/// On timeout the child is killed and the outcome reports `timed_out` with
/// whatever output was produced before the kill.
pub async fn run(command: &str, timeout: Duration) -> Result<Outcome, RunnerError> {
    let start = Instant::now();
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(RunnerError::Spawn)?;

    // Drain the pipes concurrently so a chatty child cannot dead-lock on a
    // full pipe buffer while we wait on its exit.
    let stdout_task = tokio::spawn(read_all(child.stdout.take()));
    let stderr_task = tokio::spawn(read_all(child.stderr.take()));

    let (timed_out, exit_code) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            let status = status.map_err(RunnerError::Wait)?;
            (false, status.code().unwrap_or(-1))
        }
        Err(_) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            (true, -1)
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(Outcome {
        exit_code,
        stdout: tail_snippet(&stdout, SNIPPET_LIMIT),
        stderr: tail_snippet(&stderr, SNIPPET_LIMIT),
        timed_out,
        duration: start.elapsed(),
    })
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

/// Keep the last `limit` bytes as a UTF-8-safe string.
fn tail_snippet(bytes: &[u8], limit: usize) -> String {
    let s = String::from_utf8_lossy(bytes);
    if s.len() <= limit {
        return s.into_owned();
    }
    let mut start = s.len() - limit;
    while start < s.len() && !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
