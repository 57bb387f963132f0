// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! queuectl: durable background job queue CLI.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod exit_error;
mod output;
mod supervisor;
mod table;

use clap::{Parser, Subcommand};
use output::OutputFormat;
use queuectl_core::Home;

#[derive(Parser)]
#[command(
    name = "queuectl",
    version,
    about = "Durable background job queue",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a job from a JSON payload
    Enqueue(commands::enqueue::EnqueueArgs),
    /// List jobs
    List(commands::jobs::ListArgs),
    /// Show aggregate job and worker counts
    Status,
    /// Inspect and requeue dead-lettered jobs
    Dlq(commands::dlq::DlqArgs),
    /// Manage the worker pool
    Worker(commands::worker::WorkerArgs),
    /// Read and write configuration
    Config(commands::config::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    let home = Home::resolve();

    let result = match cli.command {
        Command::Enqueue(args) => commands::enqueue::handle(args, &home, cli.output),
        Command::List(args) => commands::jobs::list(args, &home, cli.output),
        Command::Status => commands::jobs::status(&home, cli.output),
        Command::Dlq(args) => commands::dlq::handle(args, &home, cli.output),
        Command::Worker(args) => commands::worker::handle(args, &home, cli.output),
        Command::Config(args) => commands::config::handle(args, &home, cli.output),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.code);
    }
}
