// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `queuectl list` and `queuectl status` - job visibility.

use clap::Args;
use queuectl_core::{format_elapsed, format_time_ago, Clock, Home, Job, JobState, SystemClock};

use crate::exit_error::{codes, ExitError};
use crate::output::{format_or_json, handle_list, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct ListArgs {
    /// Filter by state (pending, processing, completed, failed, dlq)
    #[arg(long)]
    pub state: Option<String>,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn list(args: ListArgs, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let state = args
        .state
        .map(|s| s.parse::<JobState>())
        .transpose()
        .map_err(|e| ExitError::new(codes::USAGE, e.to_string()))?;

    let manager = super::open_manager(home)?;
    let jobs = manager.list(state, args.limit)?;

    handle_list(format, &jobs, "No jobs found", |items, out| {
        let now_ms = SystemClock.epoch_ms();
        let mut table = Table::new(vec![
            Column::left("ID"),
            Column::status("STATE"),
            Column::right("ATTEMPTS"),
            Column::left("WORKER"),
            Column::muted("NEXT RUN"),
            Column::muted("AGE"),
            Column::left("ERROR").with_max(48),
        ]);
        for job in items {
            table.row(job_row(job, now_ms));
        }
        table.render(out);
    })
}

fn job_row(job: &Job, now_ms: u64) -> Vec<String> {
    let next_run = if job.state == JobState::Pending && job.next_run_at_ms > now_ms {
        format!("in {}", format_elapsed((job.next_run_at_ms - now_ms) / 1000))
    } else {
        "-".to_string()
    };
    vec![
        job.id.clone(),
        job.state.to_string(),
        format!("{}/{}", job.attempts, job.max_retries),
        job.worker_id.clone().unwrap_or_else(|| "-".to_string()),
        next_run,
        format_time_ago(job.created_at_ms, now_ms),
        job.error_message.clone().unwrap_or_default(),
    ]
}

pub fn status(home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let manager = super::open_manager(home)?;
    let report = manager.status()?;

    format_or_json(format, &report, || {
        println!("Jobs:");
        println!("  pending     {}", report.pending);
        println!("  processing  {}", report.processing);
        println!("  completed   {}", report.completed);
        if report.failed > 0 {
            println!("  failed      {}", report.failed);
        }
        println!("  dlq         {}", report.dlq);
        println!();
        println!(
            "Workers: {} active, {} stopped",
            report.active_workers, report.stopped_workers
        );
    })
}
