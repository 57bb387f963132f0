// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use queuectl_core::{SettingsError, SpecError};
use queuectl_engine::EngineError;
use queuectl_storage::StoreError;
use std::fmt;

/// Exit codes promised to scripts driving the CLI.
pub mod codes {
    pub const GENERIC: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 3;
    pub const DUPLICATE: i32 = 4;
    pub const INVALID_STATE: i32 = 5;
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<StoreError> for ExitError {
    fn from(e: StoreError) -> Self {
        let code = match e {
            StoreError::DuplicateId(_) => codes::DUPLICATE,
            StoreError::NotFound(_) => codes::NOT_FOUND,
            StoreError::InvalidState { .. } => codes::INVALID_STATE,
            _ => codes::GENERIC,
        };
        Self::new(code, e.to_string())
    }
}

impl From<EngineError> for ExitError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Store(e) => e.into(),
            EngineError::Validation(msg) => Self::new(codes::USAGE, msg),
        }
    }
}

impl From<SpecError> for ExitError {
    fn from(e: SpecError) -> Self {
        Self::new(codes::USAGE, e.to_string())
    }
}

impl From<SettingsError> for ExitError {
    fn from(e: SettingsError) -> Self {
        let code = match e {
            SettingsError::UnknownKey(_) | SettingsError::Invalid { .. } => codes::USAGE,
            _ => codes::GENERIC,
        };
        Self::new(code, e.to_string())
    }
}

impl From<std::io::Error> for ExitError {
    fn from(e: std::io::Error) -> Self {
        Self::new(codes::GENERIC, e.to_string())
    }
}

impl From<serde_json::Error> for ExitError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(codes::GENERIC, e.to_string())
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
