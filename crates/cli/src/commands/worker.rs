// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `queuectl worker` - worker pool supervision.

use clap::{Args, Subcommand};
use queuectl_core::Home;

use crate::exit_error::{codes, ExitError};
use crate::output::{format_or_json, OutputFormat};
use crate::supervisor;

#[derive(Args)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommand,
}

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// Spawn detached worker processes
    Start {
        /// Number of workers to spawn
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Stop the workers recorded in the pid sidecar
    Stop,
    /// Run a single worker in the foreground
    Run,
}

pub fn handle(args: WorkerArgs, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    match args.command {
        WorkerCommand::Start { count } => start(count, home, format),
        WorkerCommand::Stop => stop(home, format),
        WorkerCommand::Run => supervisor::run_foreground(home),
    }
}

fn start(count: usize, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    if count == 0 {
        return Err(ExitError::new(codes::USAGE, "--count must be at least 1"));
    }

    let pids = supervisor::start(home, count)?;
    let obj = serde_json::json!({ "started": pids });
    format_or_json(format, &obj, || {
        println!(
            "Started {} worker{}",
            pids.len(),
            if pids.len() == 1 { "" } else { "s" }
        );
        for pid in &pids {
            println!("  {pid}");
        }
    })
}

fn stop(home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let summary = supervisor::stop(home)?;
    format_or_json(format, &summary, || {
        if summary.stopped.is_empty()
            && summary.killed.is_empty()
            && summary.already_gone.is_empty()
        {
            println!("No workers to stop");
            return;
        }
        for pid in &summary.stopped {
            println!("Stopped worker {pid}");
        }
        for pid in &summary.killed {
            println!("Killed worker {pid} (did not exit within the grace period)");
        }
        for pid in &summary.already_gone {
            println!("Worker {pid} was already gone");
        }
    })
}
