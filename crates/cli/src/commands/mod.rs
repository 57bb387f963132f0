// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers, one module per command group.

pub mod config;
pub mod dlq;
pub mod enqueue;
pub mod jobs;
pub mod worker;

use crate::exit_error::ExitError;
use queuectl_core::Home;
use queuectl_engine::QueueManager;
use queuectl_storage::Store;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) fn open_store(home: &Home) -> Result<(Arc<Store>, PathBuf), ExitError> {
    let db_path = home.db_path()?;
    let store = Arc::new(Store::open(&db_path)?);
    Ok((store, db_path))
}

pub(crate) fn open_manager(home: &Home) -> Result<QueueManager, ExitError> {
    let (store, db_path) = open_store(home)?;
    let settings = queuectl_engine::load_settings(&store, &db_path.to_string_lossy())?;
    Ok(QueueManager::new(store, settings))
}
