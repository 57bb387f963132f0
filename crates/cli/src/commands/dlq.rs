// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `queuectl dlq` - dead letter queue inspection and requeue.

use clap::{Args, Subcommand};
use queuectl_core::{format_time_ago, Clock, Home, SystemClock};

use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct DlqArgs {
    #[command(subcommand)]
    pub command: DlqCommand,
}

#[derive(Subcommand)]
pub enum DlqCommand {
    /// Show jobs whose retry budget is exhausted
    List,
    /// Return a dead-lettered job to the queue with a fresh budget
    Retry {
        /// Job id
        id: String,
    },
}

pub fn handle(args: DlqArgs, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    match args.command {
        DlqCommand::List => list(home, format),
        DlqCommand::Retry { id } => retry(&id, home, format),
    }
}

fn list(home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let manager = super::open_manager(home)?;
    let jobs = manager.dlq_list()?;

    handle_list(format, &jobs, "Dead letter queue is empty", |items, out| {
        let now_ms = SystemClock.epoch_ms();
        let mut table = Table::new(vec![
            Column::left("ID"),
            Column::right("ATTEMPTS"),
            Column::muted("FAILED"),
            Column::left("COMMAND").with_max(32),
            Column::left("ERROR").with_max(48),
        ]);
        for job in items {
            table.row(vec![
                job.id.clone(),
                job.attempts.to_string(),
                format_time_ago(job.updated_at_ms, now_ms),
                job.command.clone(),
                job.error_message.clone().unwrap_or_default(),
            ]);
        }
        table.render(out);
    })
}

fn retry(id: &str, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let manager = super::open_manager(home)?;
    manager.retry_dlq(id)?;

    let obj = serde_json::json!({ "id": id, "state": "pending" });
    format_or_json(format, &obj, || {
        println!("Job '{id}' requeued from the DLQ");
    })
}
