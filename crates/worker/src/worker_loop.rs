// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker state machine: register, poll, execute, report, drain.

use queuectl_core::{Clock, Job, Settings, SystemClock, WorkerId, WorkerRecord};
use queuectl_engine::{EngineError, QueueManager};
use queuectl_storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Bounded retries against a busy store before giving up on one operation.
const BUSY_RETRIES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] queuectl_storage::StoreError),
}

pub struct WorkerLoop<C: Clock = SystemClock> {
    manager: QueueManager<C>,
    store: Arc<Store>,
    id: WorkerId,
    settings: Settings,
    clock: C,
    shutdown: CancellationToken,
}

impl<C: Clock> WorkerLoop<C> {
    pub fn new(
        store: Arc<Store>,
        settings: Settings,
        clock: C,
        shutdown: CancellationToken,
    ) -> Self {
        let manager = QueueManager::with_clock(store.clone(), settings.clone(), clock.clone());
        Self {
            manager,
            store,
            id: WorkerId::for_pid(std::process::id()),
            settings,
            clock,
            shutdown,
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Run until the shutdown token fires: recover orphans left by dead
    /// peers, register, heartbeat in the background, then poll for work.
    /// The in-flight job (if any) is finished and reported before returning.
    pub async fn run(&self) -> Result<(), WorkerError> {
        self.manager.recover_from_crash()?;

        let record = WorkerRecord::register(std::process::id(), self.clock.epoch_ms());
        self.store.register_worker(&record)?;
        info!(worker = %self.id, "worker registered");

        let (heartbeat_stop, heartbeat) = self.spawn_heartbeat();
        let result = self.poll_loop().await;

        // Heartbeats outlive the shutdown signal: the claim on an in-flight
        // job must not look orphaned while it drains.
        heartbeat_stop.cancel();
        let _ = heartbeat.await;

        self.store
            .deregister_worker(&self.id, self.clock.epoch_ms())?;
        info!(worker = %self.id, "worker deregistered");
        result
    }

    fn spawn_heartbeat(&self) -> (CancellationToken, tokio::task::JoinHandle<()>) {
        let stop = CancellationToken::new();
        let store = self.store.clone();
        let id = self.id.clone();
        let clock = self.clock.clone();
        let interval = Duration::from_secs(self.settings.worker_heartbeat_interval);
        let task_stop = stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_stop.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = store.heartbeat_worker(&id, clock.epoch_ms()) {
                            warn!(worker = %id, error = %e, "heartbeat failed");
                        }
                    }
                }
            }
        });
        (stop, handle)
    }

    async fn poll_loop(&self) -> Result<(), WorkerError> {
        let poll = Duration::from_secs(self.settings.worker_poll_interval);
        loop {
            if self.shutdown.is_cancelled() {
                info!(worker = %self.id, "shutdown requested, draining");
                return Ok(());
            }
            match self.with_busy_retry(|| self.manager.claim(&self.id)).await {
                Ok(Some(job)) => self.execute(&job).await,
                Ok(None) => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {}
                        _ = tokio::time::sleep(poll) => {}
                    }
                }
                Err(EngineError::Store(e)) if e.is_busy() => {
                    warn!(error = %e, "store busy past retry budget, continuing to poll");
                    tokio::time::sleep(poll).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn execute(&self, job: &Job) {
        info!(
            id = %job.id,
            attempts = job.attempts,
            command = %job.command,
            "job claimed"
        );
        let timeout = Duration::from_secs(self.settings.job_timeout);
        let report = match crate::runner::run(&job.command, timeout).await {
            Ok(outcome) if outcome.success() => {
                self.with_busy_retry(|| self.manager.report_success(job, &self.id))
                    .await
            }
            Ok(outcome) => {
                let reason = outcome.failure_reason(self.settings.job_timeout);
                self.with_busy_retry(|| self.manager.report_failure(job, &self.id, &reason))
                    .await
                    .map(|_| ())
            }
            Err(e) => {
                let reason = e.to_string();
                self.with_busy_retry(|| self.manager.report_failure(job, &self.id, &reason))
                    .await
                    .map(|_| ())
            }
        };
        if let Err(e) = report {
            // The claim may have been recovered out from under us after a
            // heartbeat stall; the next poll continues regardless.
            warn!(id = %job.id, error = %e, "outcome report rejected");
        }
    }

    /// Retry a store operation a bounded number of times while it reports
    /// lock contention, sleeping with a little jitter in between.
    async fn with_busy_retry<T>(
        &self,
        mut op: impl FnMut() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut attempt = 0;
        loop {
            match op() {
                Err(EngineError::Store(ref e)) if e.is_busy() && attempt < BUSY_RETRIES => {
                    attempt += 1;
                    let jitter_ms = 50 + self.clock.epoch_ms() % 150;
                    warn!(attempt, "store busy, retrying");
                    tokio::time::sleep(Duration::from_millis(jitter_ms * u64::from(attempt)))
                        .await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_loop_tests.rs"]
mod tests;
