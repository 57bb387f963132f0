// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! queuectld: the QueueCTL worker process.

use clap::Parser;
use queuectl_core::{Home, Settings, SystemClock};
use queuectl_storage::Store;
use queuectl_worker::WorkerLoop;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Env var holding an `EnvFilter` directive overriding the configured level.
const LOG_ENV: &str = "QUEUECTL_LOG";

#[derive(Parser)]
#[command(name = "queuectld", version, about = "QueueCTL worker process")]
struct Args {
    /// Log to stderr instead of the worker log file
    #[arg(long)]
    foreground: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("queuectld: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let home = Home::resolve();
    let db_path = home.db_path()?;
    let store = Arc::new(Store::open(&db_path)?);
    let settings = queuectl_engine::load_settings(&store, &db_path.to_string_lossy())?;

    let _log_guard = init_tracing(&home, &settings, args.foreground)?;

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone())?;

    let worker = WorkerLoop::new(store, settings, SystemClock, shutdown);
    info!(worker = %worker.id(), db = %db_path.display(), "queuectld starting");
    worker.run().await?;
    Ok(())
}

fn init_tracing(
    home: &Home,
    settings: &Settings,
    foreground: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_filter()));

    if foreground {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    std::fs::create_dir_all(home.logs_dir())?;
    let appender = tracing_appender::rolling::never(
        home.logs_dir(),
        format!("worker-{}.log", std::process::id()),
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

/// First SIGTERM/SIGINT requests a drain; a second one force-exits, leaving
/// any in-flight job in `processing` for the next startup's recovery.
fn spawn_signal_listener(
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        info!("termination signal received, draining");
        shutdown.cancel();

        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        warn!("second signal, exiting immediately; in-flight work recovers on next startup");
        std::process::exit(130);
    });
    Ok(())
}
