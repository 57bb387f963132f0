// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job table operations.
//!
//! The claim is one `UPDATE ... WHERE id = (SELECT ... LIMIT 1) RETURNING`
//! statement, so selection and mutation happen in a single serialized step:
//! two processes claiming concurrently always receive distinct jobs or none.

use crate::store::{Store, StoreError};
use queuectl_core::{Job, JobState, WorkerId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

const JOB_COLUMNS: &str = "id, command, state, attempts, max_retries, worker_id, \
     next_run_at, claimed_at, error_message, created_at, updated_at, metadata";

const CLAIM_SQL: &str = "
UPDATE jobs SET
    state = 'processing',
    worker_id = ?1,
    claimed_at = ?2,
    attempts = attempts + 1,
    updated_at = ?2
WHERE id = (
    SELECT id FROM jobs
    WHERE state = 'pending' AND next_run_at <= ?2
    ORDER BY next_run_at ASC, created_at ASC, id ASC
    LIMIT 1
)
RETURNING id, command, state, attempts, max_retries, worker_id,
          next_run_at, claimed_at, error_message, created_at, updated_at, metadata";

const RECOVER_SQL: &str = "
UPDATE jobs SET
    state = 'pending',
    worker_id = NULL,
    claimed_at = NULL,
    attempts = CASE WHEN attempts > 0 THEN attempts - 1 ELSE 0 END,
    updated_at = ?2
WHERE state = 'processing'
  AND (worker_id IS NULL
       OR worker_id NOT IN (
           SELECT id FROM workers
           WHERE status = 'active' AND last_heartbeat >= ?1))
RETURNING id";

impl Store {
    /// Insert a fresh job row. Fails with `DuplicateId` if the id exists.
    pub fn insert_job(&self, job: &Job) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&job.metadata)?;
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO jobs (id, command, state, attempts, max_retries, worker_id, \
                 next_run_at, claimed_at, error_message, created_at, updated_at, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    job.id,
                    job.command,
                    job.state.as_str(),
                    job.attempts,
                    job.max_retries,
                    job.worker_id,
                    job.next_run_at_ms as i64,
                    job.claimed_at_ms.map(|ms| ms as i64),
                    job.error_message,
                    job.created_at_ms as i64,
                    job.updated_at_ms as i64,
                    metadata,
                ],
            );
            match result {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::DuplicateId(job.id.clone()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        self.with_conn(|conn| {
            let job = conn
                .query_row(
                    &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                    [id],
                    job_from_row,
                )
                .optional()?;
            Ok(job)
        })
    }

    /// List jobs, optionally filtered by state, oldest first.
    pub fn list_jobs(
        &self,
        state: Option<JobState>,
        limit: Option<usize>,
    ) -> Result<Vec<Job>, StoreError> {
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        self.with_conn(|conn| {
            let jobs = match state {
                Some(state) => {
                    let mut stmt = conn.prepare_cached(&format!(
                        "SELECT {JOB_COLUMNS} FROM jobs WHERE state = ?1 \
                         ORDER BY created_at ASC, id ASC LIMIT ?2"
                    ))?;
                    let rows = stmt.query_map(params![state.as_str(), limit], job_from_row)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare_cached(&format!(
                        "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at ASC, id ASC LIMIT ?1"
                    ))?;
                    let rows = stmt.query_map(params![limit], job_from_row)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(jobs)
        })
    }

    /// Per-state job counts (states with no jobs are absent).
    pub fn count_jobs_by_state(&self) -> Result<Vec<(JobState, u64)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare_cached("SELECT state, COUNT(*) FROM jobs GROUP BY state")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                let (state, count) = row?;
                if let Ok(state) = state.parse::<JobState>() {
                    counts.push((state, count as u64));
                }
            }
            Ok(counts)
        })
    }

    /// Atomically claim the next eligible pending job for `worker_id`.
    ///
    /// Eligible: `state = pending` and `next_run_at <= now`, ordered by
    /// `next_run_at`, then `created_at`, then `id`. The claimed job comes back
    /// with `attempts` already incremented.
    pub fn claim_next(
        &self,
        worker_id: &WorkerId,
        now_ms: u64,
    ) -> Result<Option<Job>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(CLAIM_SQL)?;
            let job = stmt
                .query_row(params![worker_id.as_str(), now_ms as i64], job_from_row)
                .optional()?;
            Ok(job)
        })
    }

    /// Terminal success. Precondition: the job is `processing` and held by
    /// `worker_id`; otherwise `NotFound` / `InvalidState`.
    pub fn mark_completed(
        &self,
        id: &str,
        worker_id: &WorkerId,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "UPDATE jobs SET state = 'completed', worker_id = NULL, claimed_at = NULL, \
                 updated_at = ?3 \
                 WHERE id = ?1 AND state = 'processing' AND worker_id = ?2",
                params![id, worker_id.as_str(), now_ms as i64],
            )?;
            if n == 0 {
                return Err(claim_precondition_failure(tx, id));
            }
            Ok(())
        })
    }

    /// Failed attempt with retry budget left: back to `pending`, eligible
    /// again at `next_run_at_ms`. Same precondition as [`Store::mark_completed`].
    pub fn fail_and_reschedule(
        &self,
        id: &str,
        worker_id: &WorkerId,
        error: &str,
        next_run_at_ms: u64,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "UPDATE jobs SET state = 'pending', worker_id = NULL, claimed_at = NULL, \
                 error_message = ?3, next_run_at = ?4, updated_at = ?5 \
                 WHERE id = ?1 AND state = 'processing' AND worker_id = ?2",
                params![
                    id,
                    worker_id.as_str(),
                    error,
                    next_run_at_ms as i64,
                    now_ms as i64
                ],
            )?;
            if n == 0 {
                return Err(claim_precondition_failure(tx, id));
            }
            Ok(())
        })
    }

    /// Failed attempt with the budget exhausted: move to the DLQ.
    pub fn fail_and_dlq(
        &self,
        id: &str,
        worker_id: &WorkerId,
        error: &str,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "UPDATE jobs SET state = 'dlq', worker_id = NULL, claimed_at = NULL, \
                 error_message = ?3, updated_at = ?4 \
                 WHERE id = ?1 AND state = 'processing' AND worker_id = ?2",
                params![id, worker_id.as_str(), error, now_ms as i64],
            )?;
            if n == 0 {
                return Err(claim_precondition_failure(tx, id));
            }
            Ok(())
        })
    }

    /// Operator requeue of a dead-lettered job: fresh retry budget,
    /// immediately claimable.
    pub fn requeue_from_dlq(&self, id: &str, now_ms: u64) -> Result<(), StoreError> {
        self.with_tx(|tx| {
            let n = tx.execute(
                "UPDATE jobs SET state = 'pending', attempts = 0, error_message = NULL, \
                 next_run_at = ?2, updated_at = ?2 \
                 WHERE id = ?1 AND state = 'dlq'",
                params![id, now_ms as i64],
            )?;
            if n == 0 {
                return Err(match job_state(tx, id) {
                    Ok(Some(state)) => StoreError::InvalidState {
                        id: id.to_string(),
                        state,
                        expected: "dlq",
                    },
                    Ok(None) => StoreError::NotFound(id.to_string()),
                    Err(e) => e,
                });
            }
            Ok(())
        })
    }

    /// Revert every `processing` job whose claiming worker is gone: missing
    /// from the workers table, marked stopped, or heartbeat older than
    /// `stale_before_ms`. The interrupted attempt is refunded (`attempts -= 1`,
    /// floor 0). Returns the recovered job ids.
    pub fn recover_orphans(
        &self,
        stale_before_ms: u64,
        now_ms: u64,
    ) -> Result<Vec<String>, StoreError> {
        self.with_tx(|tx| {
            let mut stmt = tx.prepare(RECOVER_SQL)?;
            let rows = stmt.query_map(params![stale_before_ms as i64, now_ms as i64], |row| {
                row.get::<_, String>(0)
            })?;
            let ids: Vec<String> = rows.collect::<Result<_, _>>()?;
            for id in &ids {
                tracing::debug!(id = %id, "reverted orphaned claim");
            }
            Ok(ids)
        })
    }
}

fn job_state(conn: &Connection, id: &str) -> Result<Option<String>, StoreError> {
    let state = conn
        .query_row("SELECT state FROM jobs WHERE id = ?1", [id], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(state)
}

/// Classify a guarded-update miss: absent row vs wrong state/claimant.
fn claim_precondition_failure(conn: &Connection, id: &str) -> StoreError {
    match job_state(conn, id) {
        Ok(Some(state)) => StoreError::InvalidState {
            id: id.to_string(),
            state,
            expected: "processing",
        },
        Ok(None) => StoreError::NotFound(id.to_string()),
        Err(e) => e,
    }
}

fn job_from_row(row: &Row<'_>) -> Result<Job, rusqlite::Error> {
    let state: String = row.get(2)?;
    let state = state.parse::<JobState>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let metadata: String = row.get(11)?;
    let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Job {
        id: row.get(0)?,
        command: row.get(1)?,
        state,
        attempts: row.get::<_, i64>(3)? as u32,
        max_retries: row.get::<_, i64>(4)? as u32,
        worker_id: row.get(5)?,
        next_run_at_ms: row.get::<_, i64>(6)? as u64,
        claimed_at_ms: row.get::<_, Option<i64>>(7)?.map(|ms| ms as u64),
        error_message: row.get(8)?,
        created_at_ms: row.get::<_, i64>(9)? as u64,
        updated_at_ms: row.get::<_, i64>(10)? as u64,
        metadata,
    })
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
