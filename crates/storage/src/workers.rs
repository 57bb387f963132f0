// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker table operations.

use crate::store::{Store, StoreError};
use queuectl_core::{WorkerId, WorkerRecord, WorkerStatus};
use rusqlite::{params, Row};

impl Store {
    /// Register (or re-register, after pid reuse) a worker process.
    pub fn register_worker(&self, record: &WorkerRecord) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO workers (id, pid, status, last_heartbeat, started_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(id) DO UPDATE SET \
                 pid = excluded.pid, status = excluded.status, \
                 last_heartbeat = excluded.last_heartbeat, started_at = excluded.started_at",
                params![
                    record.id.as_str(),
                    record.pid,
                    record.status.to_string(),
                    record.last_heartbeat_ms as i64,
                    record.started_at_ms as i64,
                ],
            )?;
            Ok(())
        })
    }

    /// Refresh a worker's liveness timestamp. Also flips the row back to
    /// `active` in case a racing prune marked it stopped while it was alive.
    pub fn heartbeat_worker(&self, id: &WorkerId, now_ms: u64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE workers SET last_heartbeat = ?2, status = 'active' WHERE id = ?1",
                params![id.as_str(), now_ms as i64],
            )?;
            if n == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    /// Graceful-exit bookkeeping: mark the worker stopped.
    pub fn deregister_worker(&self, id: &WorkerId, now_ms: u64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE workers SET status = 'stopped', last_heartbeat = ?2 WHERE id = ?1",
                params![id.as_str(), now_ms as i64],
            )?;
            Ok(())
        })
    }

    pub fn list_workers(&self) -> Result<Vec<WorkerRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, pid, status, last_heartbeat, started_at FROM workers \
                 ORDER BY started_at ASC, id ASC",
            )?;
            let rows = stmt.query_map([], worker_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Mark every active worker whose heartbeat predates `before_ms` as
    /// stopped. Returns how many rows changed.
    pub fn prune_stale_workers(&self, before_ms: u64) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE workers SET status = 'stopped' \
                 WHERE status = 'active' AND last_heartbeat < ?1",
                params![before_ms as i64],
            )?;
            Ok(n)
        })
    }
}

fn worker_from_row(row: &Row<'_>) -> Result<WorkerRecord, rusqlite::Error> {
    let status: String = row.get(2)?;
    let status = status.parse::<WorkerStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(WorkerRecord {
        id: WorkerId::new(row.get::<_, String>(0)?),
        pid: row.get::<_, i64>(1)? as u32,
        status,
        last_heartbeat_ms: row.get::<_, i64>(3)? as u64,
        started_at_ms: row.get::<_, i64>(4)? as u64,
    })
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
