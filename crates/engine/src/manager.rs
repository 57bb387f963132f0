// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue manager: the lifecycle operations every front-end goes through.

use crate::backoff;
use queuectl_core::{Clock, Job, JobSpec, JobState, Settings, SystemClock, WorkerId, WorkerStatus};
use queuectl_storage::{Store, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),
}

/// Aggregate counts for the `status` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub dlq: u64,
    pub active_workers: u64,
    pub stopped_workers: u64,
}

/// What `recover_from_crash` cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub recovered_jobs: Vec<String>,
    pub pruned_workers: usize,
}

/// Stateless orchestration layer over the store.
pub struct QueueManager<C: Clock = SystemClock> {
    store: Arc<Store>,
    settings: Settings,
    clock: C,
}

impl QueueManager<SystemClock> {
    pub fn new(store: Arc<Store>, settings: Settings) -> Self {
        Self::with_clock(store, settings, SystemClock)
    }
}

impl<C: Clock> QueueManager<C> {
    pub fn with_clock(store: Arc<Store>, settings: Settings, clock: C) -> Self {
        Self {
            store,
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Accept a validated payload into the queue as a pending job.
    pub fn enqueue(&self, spec: JobSpec) -> Result<Job, EngineError> {
        let max_retries = spec.max_retries.unwrap_or(self.settings.max_retries);
        let job = Job::pending(spec, max_retries, self.clock.epoch_ms());
        self.store.insert_job(&job)?;
        info!(id = %job.id, max_retries, "job enqueued");
        Ok(job)
    }

    /// Claim the next eligible job for `worker_id`, if any.
    pub fn claim(&self, worker_id: &WorkerId) -> Result<Option<Job>, EngineError> {
        Ok(self.store.claim_next(worker_id, self.clock.epoch_ms())?)
    }

    pub fn report_success(&self, job: &Job, worker_id: &WorkerId) -> Result<(), EngineError> {
        self.store
            .mark_completed(&job.id, worker_id, self.clock.epoch_ms())?;
        info!(id = %job.id, attempts = job.attempts, "job completed");
        Ok(())
    }

    /// Record a failed attempt: reschedule under backoff while budget
    /// remains, dead-letter once `attempts` reaches `max_retries`. Returns
    /// the state the job resolved to.
    pub fn report_failure(
        &self,
        job: &Job,
        worker_id: &WorkerId,
        error: &str,
    ) -> Result<JobState, EngineError> {
        let now = self.clock.epoch_ms();
        if job.attempts >= job.max_retries {
            self.store.fail_and_dlq(&job.id, worker_id, error, now)?;
            warn!(
                id = %job.id,
                attempts = job.attempts,
                error,
                "job moved to dlq"
            );
            return Ok(JobState::Dlq);
        }

        let delay_ms = backoff::delay_ms(
            self.settings.backoff_base,
            job.attempts,
            self.settings.backoff_max_delay,
        );
        self.store
            .fail_and_reschedule(&job.id, worker_id, error, now + delay_ms, now)?;
        info!(
            id = %job.id,
            attempts = job.attempts,
            retry_in_ms = delay_ms,
            error,
            "job failed, retry scheduled"
        );
        Ok(JobState::Pending)
    }

    /// Operator action: return a dead-lettered job to the queue with a fresh
    /// retry budget.
    pub fn retry_dlq(&self, id: &str) -> Result<(), EngineError> {
        self.store.requeue_from_dlq(id, self.clock.epoch_ms())?;
        info!(id, "dlq job requeued");
        Ok(())
    }

    /// Revert claims held by dead workers and prune their registrations.
    ///
    /// Safe to call repeatedly; runs at every worker startup. A worker is
    /// considered dead once its heartbeat is older than twice the heartbeat
    /// interval.
    pub fn recover_from_crash(&self) -> Result<RecoveryReport, EngineError> {
        let now = self.clock.epoch_ms();
        let stale_before =
            now.saturating_sub(2 * self.settings.worker_heartbeat_interval * 1000);

        let recovered_jobs = self.store.recover_orphans(stale_before, now)?;
        let pruned_workers = self.store.prune_stale_workers(stale_before)?;

        if !recovered_jobs.is_empty() || pruned_workers > 0 {
            info!(
                recovered = recovered_jobs.len(),
                pruned_workers, "crash recovery"
            );
        }
        Ok(RecoveryReport {
            recovered_jobs,
            pruned_workers,
        })
    }

    pub fn list(
        &self,
        state: Option<JobState>,
        limit: Option<usize>,
    ) -> Result<Vec<Job>, EngineError> {
        Ok(self.store.list_jobs(state, limit)?)
    }

    pub fn dlq_list(&self) -> Result<Vec<Job>, EngineError> {
        Ok(self.store.list_jobs(Some(JobState::Dlq), None)?)
    }

    pub fn status(&self) -> Result<StatusReport, EngineError> {
        let mut report = StatusReport::default();
        for (state, count) in self.store.count_jobs_by_state()? {
            match state {
                JobState::Pending => report.pending = count,
                JobState::Processing => report.processing = count,
                JobState::Completed => report.completed = count,
                JobState::Failed => report.failed = count,
                JobState::Dlq => report.dlq = count,
            }
        }
        for worker in self.store.list_workers()? {
            match worker.status {
                WorkerStatus::Active => report.active_workers += 1,
                WorkerStatus::Stopped => report.stopped_workers += 1,
            }
        }
        Ok(report)
    }
}

/// Build the effective settings: defaults, then stored config overrides.
///
/// `db_path` is resolved by the caller from the sidecar (the store had to be
/// opened before this runs). An unreadable override is skipped with a
/// warning rather than wedging every command.
pub fn load_settings(store: &Store, db_path: &str) -> Result<Settings, EngineError> {
    let mut settings = Settings {
        db_path: db_path.to_string(),
        ..Settings::default()
    };
    for (key, value) in store.all_config()? {
        if key == "db_path" {
            continue;
        }
        if let Err(e) = settings.apply(&key, &value) {
            warn!(key = %key, value = %value, error = %e, "ignoring stored config override");
        }
    }
    Ok(settings)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
