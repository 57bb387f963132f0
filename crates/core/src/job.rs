// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a job.
///
/// `Failed` is a transient value used only inside the fail-and-schedule
/// transition; a job at rest is always `pending`, `processing`, `completed`,
/// or `dlq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
    Dlq,
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Dlq => "dlq",
    }
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Dlq => "dlq",
        }
    }

    /// States that require an explicit operator action to leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Dlq)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown job state: {0}")]
pub struct ParseJobStateError(String);

impl std::str::FromStr for JobState {
    type Err = ParseJobStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "processing" => Ok(JobState::Processing),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "dlq" => Ok(JobState::Dlq),
            other => Err(ParseJobStateError(other.to_string())),
        }
    }
}

/// A persisted job row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Client-supplied unique identifier.
    pub id: String,
    /// Shell command executed verbatim by the worker's launcher.
    pub command: String,
    pub state: JobState,
    /// Number of times execution has started (incremented at claim).
    pub attempts: u32,
    pub max_retries: u32,
    /// Worker currently holding the claim, if any.
    pub worker_id: Option<String>,
    /// Epoch ms after which the job is eligible for claiming.
    pub next_run_at_ms: u64,
    /// Epoch ms the current claim was taken, if any.
    pub claimed_at_ms: Option<u64>,
    /// Truncated tail of the last failure's output, if any.
    pub error_message: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Opaque key/value pairs carried through untouched.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Job {
    /// Build the initial pending row for an accepted enqueue payload.
    pub fn pending(spec: JobSpec, max_retries: u32, now_ms: u64) -> Self {
        Self {
            id: spec.id,
            command: spec.command,
            state: JobState::Pending,
            attempts: 0,
            max_retries,
            worker_id: None,
            next_run_at_ms: now_ms,
            claimed_at_ms: None,
            error_message: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            metadata: spec.metadata,
        }
    }
}

/// Validated enqueue payload.
///
/// Parsed from the client's JSON object: `id` and `command` are required
/// non-empty strings, `max_retries` an optional integer >= 1, and every other
/// field is carried as opaque metadata (string values verbatim, anything else
/// as its compact JSON text).
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub id: String,
    pub command: String,
    pub max_retries: Option<u32>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("invalid job JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job payload must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' must be a non-empty string")]
    EmptyField(&'static str),

    #[error("max_retries must be an integer >= 1")]
    InvalidMaxRetries,
}

impl JobSpec {
    pub fn from_json(payload: &str) -> Result<Self, SpecError> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        let serde_json::Value::Object(mut map) = value else {
            return Err(SpecError::NotAnObject);
        };

        let id = take_string(&mut map, "id")?;
        let command = take_string(&mut map, "command")?;

        let max_retries = match map.remove("max_retries") {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .filter(|n| (1..=u64::from(u32::MAX)).contains(n))
                    .map(|n| n as u32)
                    .ok_or(SpecError::InvalidMaxRetries)?,
            ),
        };

        let metadata = map
            .into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();

        Ok(Self {
            id,
            command,
            max_retries,
            metadata,
        })
    }
}

fn take_string(
    map: &mut serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<String, SpecError> {
    match map.remove(field) {
        None => Err(SpecError::MissingField(field)),
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(SpecError::EmptyField(field)),
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
