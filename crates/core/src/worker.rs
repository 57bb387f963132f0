// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identifier and registration record.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a worker process (`worker-<pid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl WorkerId {
    /// Create a new WorkerId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The conventional identifier for the worker running as `pid`.
    pub fn for_pid(pid: u32) -> Self {
        Self(format!("worker-{pid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for WorkerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Liveness status of a registered worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Active,
    Stopped,
}

crate::simple_display! {
    WorkerStatus {
        Active => "active",
        Stopped => "stopped",
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown worker status: {0}")]
pub struct ParseWorkerStatusError(String);

impl std::str::FromStr for WorkerStatus {
    type Err = ParseWorkerStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(WorkerStatus::Active),
            "stopped" => Ok(WorkerStatus::Stopped),
            other => Err(ParseWorkerStatusError(other.to_string())),
        }
    }
}

/// Registration row for a worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub pid: u32,
    pub status: WorkerStatus,
    pub last_heartbeat_ms: u64,
    pub started_at_ms: u64,
}

impl WorkerRecord {
    /// Fresh active registration for the process `pid`.
    pub fn register(pid: u32, now_ms: u64) -> Self {
        Self {
            id: WorkerId::for_pid(pid),
            pid,
            status: WorkerStatus::Active,
            last_heartbeat_ms: now_ms,
            started_at_ms: now_ms,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
