// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! queuectl-storage: the durable store.
//!
//! A single SQLite file owns all job, worker, and config rows. Every public
//! operation is one transaction, and the file may be shared by any number of
//! OS processes; SQLite's locking plus immediate write transactions give the
//! atomic claim/visibility guarantees the queue manager builds on.

mod config;
mod jobs;
mod store;
mod workers;

pub use store::{Store, StoreError};
