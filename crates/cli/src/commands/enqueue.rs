// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `queuectl enqueue` - submit a job.

use clap::Args;
use queuectl_core::{Home, JobSpec};

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct EnqueueArgs {
    /// Job payload: {"id": "...", "command": "...", "max_retries"?: N, ...metadata}
    pub job: String,
}

pub fn handle(args: EnqueueArgs, home: &Home, format: OutputFormat) -> Result<(), ExitError> {
    let spec = JobSpec::from_json(&args.job)?;
    let manager = super::open_manager(home)?;
    let job = manager.enqueue(spec)?;

    let obj = serde_json::json!({
        "id": job.id,
        "state": job.state,
        "max_retries": job.max_retries,
    });
    format_or_json(format, &obj, || {
        println!("Enqueued job '{}'", job.id);
    })
}
